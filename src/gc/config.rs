use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use super::stats::{CategoryCounts, CleanerState, PrepareStats, SweepStats};
use super::sweep::{SweepOptions, sweep};
use crate::discovery::{CacheRoot, discover_roots};
use crate::error::{HoldError, Result};
use crate::logging::Logger;
use crate::marker::usage_signal;
use crate::metadata::{
    discard_snapshot, load_snapshot, peek_snapshot, save_snapshot, snapshot_path,
};
use crate::state::{CacheKind, Snapshot};

/// Default name of the usage marker inside a version cache.
pub const DEFAULT_MARKER_FILE_NAME: &str = "gc.properties";

/// The two-phase cache cleaner
#[derive(Debug, Clone)]
pub struct CacheCleaner {
    /// Gradle user home to clean
    cache_home: PathBuf,
    /// Directory holding the snapshot between phases
    staging_dir: PathBuf,
    /// Dry run mode - report deletions without performing them
    dry_run: bool,
    /// Name of the usage marker inside each version cache
    marker_file_name: String,
    /// Remove group/artifact directories emptied by module deletions
    prune_empty_dirs: bool,
    /// Verbosity level for output
    verbose: u8,
    /// Suppress informational logging when true
    quiet: bool,
}

impl CacheCleaner {
    /// Creates a cleaner with default options.
    pub fn new(cache_home: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_home: cache_home.into(),
            staging_dir: staging_dir.into(),
            dry_run: false,
            marker_file_name: DEFAULT_MARKER_FILE_NAME.to_string(),
            prune_empty_dirs: true,
            verbose: 0,
            quiet: false,
        }
    }

    /// Creates a new builder for [`CacheCleaner`]
    pub fn builder() -> CacheCleanerBuilder {
        CacheCleanerBuilder::default()
    }

    /// Get the cache home
    pub fn cache_home(&self) -> &Path {
        &self.cache_home
    }

    /// Get the staging directory
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Check if dry run mode is enabled
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Get the usage marker file name
    pub fn marker_file_name(&self) -> &str {
        &self.marker_file_name
    }

    /// Check if empty directory pruning is enabled
    pub fn prune_empty_dirs(&self) -> bool {
        self.prune_empty_dirs
    }

    /// Get the verbosity level
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn quiet(&self) -> bool {
        self.quiet
    }

    fn logger(&self) -> Logger {
        Logger::new(self.verbose, self.quiet)
    }

    /// Location of this cache home's snapshot.
    ///
    /// Uses the canonical cache home when it exists, so relative and
    /// absolute spellings of the same home share a snapshot.
    pub fn snapshot_path(&self) -> Result<PathBuf> {
        let home = fs::canonicalize(&self.cache_home).unwrap_or_else(|_| self.cache_home.clone());
        snapshot_path(&self.staging_dir, &home)
    }

    /// Phase 1: records the usage signal of every cache root.
    ///
    /// Non-destructive. Running it again replaces the snapshot with a fresh
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::CacheHomeNotFound`] if the cache home is missing
    /// and [`HoldError::StagingDir`] if the snapshot cannot be written.
    /// Unreadable roots are skipped with a warning.
    pub fn prepare(&self) -> Result<PrepareStats> {
        let log = self.logger();
        let cache_home = self.resolve_cache_home()?;
        let home_text = utf8(&cache_home)?;

        fs::create_dir_all(&self.staging_dir).map_err(|source| HoldError::StagingDir {
            path: self.staging_dir.clone(),
            source,
        })?;

        log.verbose(1, format!("Scanning cache home {}", cache_home.display()));

        let roots: Vec<CacheRoot> =
            discover_roots(&cache_home, &self.marker_file_name, log).collect();
        let signals: Vec<(CacheRoot, u128)> = roots
            .into_par_iter()
            .map(|root| {
                let signal = usage_signal(&root, log);
                (root, signal)
            })
            .collect();

        let mut snapshot = Snapshot::new(home_text);
        let mut stats = PrepareStats::default();
        for (root, signal) in signals {
            log.verbose(2, format!("Recording {} {}", root.kind(), root.key()));
            stats.recorded.add(root.kind());
            snapshot.record(root.key(), root.kind(), signal);
        }

        let path = snapshot_path(&self.staging_dir, &cache_home)?;
        save_snapshot(&snapshot, &path)?;
        log.verbose(1, format!("Snapshot written to {}", path.display()));

        stats.snapshot_path = path;
        Ok(stats)
    }

    /// Phase 2: deletes every cache entry whose usage signal did not advance
    /// since [`prepare`](Self::prepare).
    ///
    /// Without a snapshot this is a no-op. A successful non-dry run consumes
    /// the snapshot, so running it twice never deletes twice.
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::CacheHomeNotFound`] if the cache home is missing
    /// and [`HoldError::StagingDir`] if the consumed snapshot cannot be
    /// removed. Per-entry delete failures are reported in
    /// [`SweepStats::failures`] instead.
    pub fn force_cleanup(&self) -> Result<SweepStats> {
        let log = self.logger();
        let cache_home = self.resolve_cache_home()?;
        let home_text = utf8(&cache_home)?;
        self.check_staging_dir()?;
        let path = snapshot_path(&self.staging_dir, &cache_home)?;

        let Some(snapshot) = load_snapshot(&path, log)? else {
            log.info("No snapshot found; run 'prepare' before the build. Nothing to clean.");
            return Ok(SweepStats::skipped());
        };

        if snapshot.cache_home != home_text {
            log.warn(format!(
                "snapshot {} was taken for '{}', not '{}'; skipping cleanup",
                path.display(),
                snapshot.cache_home,
                home_text
            ));
            return Ok(SweepStats::skipped());
        }

        log.verbose(
            1,
            format!(
                "Sweeping {} against {} recorded roots",
                cache_home.display(),
                snapshot.len()
            ),
        );

        let roots: Vec<CacheRoot> =
            discover_roots(&cache_home, &self.marker_file_name, log).collect();
        let options = SweepOptions {
            dry_run: self.dry_run,
            prune_empty_dirs: self.prune_empty_dirs,
        };
        let stats = sweep(&cache_home, &roots, &snapshot, options, log);

        if !self.dry_run {
            discard_snapshot(&path)?;
        }

        Ok(stats)
    }

    /// Reports whether a snapshot is waiting to be swept.
    ///
    /// Read-only: a corrupt snapshot is reported as not prepared and left
    /// for `force_cleanup` or `reset` to discard.
    pub fn state(&self) -> Result<CleanerState> {
        self.check_staging_dir()?;
        let path = self.snapshot_path()?;
        Ok(match peek_snapshot(&path, self.logger())? {
            Some(snapshot) => {
                let mut recorded = CategoryCounts::default();
                for kind in CacheKind::ALL {
                    recorded.set(kind, snapshot.count_of(kind));
                }
                CleanerState::Prepared {
                    captured_at_nanos: snapshot.captured_at_nanos,
                    roots: snapshot.len(),
                    recorded,
                }
            }
            None => CleanerState::NotPrepared,
        })
    }

    /// Discards any pending snapshot, returning to [`CleanerState::NotPrepared`].
    pub fn reset(&self) -> Result<()> {
        discard_snapshot(&self.snapshot_path()?)
    }

    /// A staging path that exists but is not a directory can never hold a
    /// snapshot.
    fn check_staging_dir(&self) -> Result<()> {
        if self.staging_dir.exists() && !self.staging_dir.is_dir() {
            return Err(HoldError::StagingDir {
                path: self.staging_dir.clone(),
                source: io::Error::new(ErrorKind::NotADirectory, "not a directory"),
            });
        }
        Ok(())
    }

    fn resolve_cache_home(&self) -> Result<PathBuf> {
        if !self.cache_home.is_dir() {
            return Err(HoldError::CacheHomeNotFound(self.cache_home.clone()));
        }
        fs::canonicalize(&self.cache_home).map_err(|source| HoldError::IoError {
            path: self.cache_home.clone(),
            source,
        })
    }
}

fn utf8(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| HoldError::InvalidUtf8Path(path.to_path_buf()))
}

/// Builder for [`CacheCleaner`]
#[derive(Debug, Default)]
pub struct CacheCleanerBuilder {
    cache_home: Option<PathBuf>,
    staging_dir: Option<PathBuf>,
    dry_run: bool,
    marker_file_name: Option<String>,
    prune_empty_dirs: Option<bool>,
    verbose: u8,
    quiet: bool,
}

impl CacheCleanerBuilder {
    /// Set the cache home
    pub fn cache_home(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_home = Some(dir.into());
        self
    }

    /// Set the staging directory
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Enable dry run mode
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Set the usage marker file name
    pub fn marker_file_name(mut self, name: impl Into<String>) -> Self {
        self.marker_file_name = Some(name.into());
        self
    }

    /// Enable or disable pruning of emptied group/artifact directories
    pub fn prune_empty_dirs(mut self, enabled: bool) -> Self {
        self.prune_empty_dirs = Some(enabled);
        self
    }

    /// Set the verbosity level
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable or disable quiet mode
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build the [`CacheCleaner`]
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::ConfigError`] if the cache home or staging
    /// directory is missing, or if the marker file name is not a plain file
    /// name.
    pub fn build(self) -> Result<CacheCleaner> {
        let cache_home = self
            .cache_home
            .ok_or_else(|| HoldError::ConfigError("cache_home is required".to_string()))?;
        let staging_dir = self
            .staging_dir
            .ok_or_else(|| HoldError::ConfigError("staging_dir is required".to_string()))?;

        let marker_file_name = self
            .marker_file_name
            .unwrap_or_else(|| DEFAULT_MARKER_FILE_NAME.to_string());
        if marker_file_name.is_empty()
            || marker_file_name.contains(['/', '\\'])
            || marker_file_name == "."
            || marker_file_name == ".."
        {
            return Err(HoldError::ConfigError(format!(
                "invalid marker file name '{marker_file_name}'"
            )));
        }

        Ok(CacheCleaner {
            cache_home,
            staging_dir,
            dry_run: self.dry_run,
            marker_file_name,
            prune_empty_dirs: self.prune_empty_dirs.unwrap_or(true),
            verbose: self.verbose,
            quiet: self.quiet,
        })
    }
}
