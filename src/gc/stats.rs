use std::fmt;
use std::path::PathBuf;

use crate::state::CacheKind;
use crate::timestamp::describe_age;

/// Per-category counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CategoryCounts {
    pub modules: usize,
    pub build_cache: usize,
    pub versions: usize,
    pub wrapper_dists: usize,
}

impl CategoryCounts {
    /// Increments the counter for `kind`.
    pub fn add(&mut self, kind: CacheKind) {
        *self.slot(kind) += 1;
    }

    /// Overwrites the counter for `kind`.
    pub fn set(&mut self, kind: CacheKind, count: usize) {
        *self.slot(kind) = count;
    }

    /// Counter for `kind`.
    pub fn get(&self, kind: CacheKind) -> usize {
        match kind {
            CacheKind::ModuleCache => self.modules,
            CacheKind::BuildCache => self.build_cache,
            CacheKind::VersionCache => self.versions,
            CacheKind::WrapperDistCache => self.wrapper_dists,
        }
    }

    /// Sum over all categories.
    pub fn total(&self) -> usize {
        self.modules + self.build_cache + self.versions + self.wrapper_dists
    }

    fn slot(&mut self, kind: CacheKind) -> &mut usize {
        match kind {
            CacheKind::ModuleCache => &mut self.modules,
            CacheKind::BuildCache => &mut self.build_cache,
            CacheKind::VersionCache => &mut self.versions,
            CacheKind::WrapperDistCache => &mut self.wrapper_dists,
        }
    }
}

/// Statistics about a `prepare` run
#[derive(Debug, Default, Clone)]
pub struct PrepareStats {
    /// Roots recorded in the snapshot, per category
    pub recorded: CategoryCounts,
    /// Where the snapshot was written
    pub snapshot_path: PathBuf,
}

/// An entry the sweep wanted to delete but could not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Statistics about a `force_cleanup` run
#[derive(Debug, Default, Clone)]
pub struct SweepStats {
    /// No usable snapshot was found, so nothing was examined
    pub skipped: bool,
    /// Whether deletions were only reported
    pub dry_run: bool,
    /// Entries removed (or, in a dry run, that would be removed)
    pub removed: CategoryCounts,
    /// Entries retained because their usage signal advanced, or because
    /// they are linked to a retained version
    pub retained_active: usize,
    /// Entries retained because they did not exist at `prepare` time
    pub retained_new: usize,
    /// Empty group/artifact directories removed after module deletions
    pub pruned_dirs: usize,
    /// Total bytes freed
    pub bytes_freed: u64,
    /// Per-entry delete failures; never fatal
    pub failures: Vec<SweepFailure>,
}

impl SweepStats {
    pub(crate) fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    /// Total number of entries retained.
    pub fn retained(&self) -> usize {
        self.retained_active + self.retained_new
    }
}

/// Where the two-phase cycle currently stands for one cache home.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanerState {
    /// No snapshot: `force_cleanup` would be a no-op.
    NotPrepared,
    /// A snapshot is waiting to be swept.
    Prepared {
        /// Capture time in nanoseconds since UNIX_EPOCH
        captured_at_nanos: u128,
        /// Number of recorded roots
        roots: usize,
        /// Recorded roots per category
        recorded: CategoryCounts,
    },
}

impl fmt::Display for CleanerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanerState::NotPrepared => f.write_str("not prepared"),
            CleanerState::Prepared {
                captured_at_nanos,
                roots,
                ..
            } => write!(
                f,
                "prepared {} with {roots} cache roots",
                describe_age(*captured_at_nanos)
            ),
        }
    }
}
