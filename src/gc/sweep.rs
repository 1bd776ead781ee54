use std::collections::HashSet;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use rayon::prelude::*;

use super::size::calculate_entry_size;
use super::stats::{SweepFailure, SweepStats};
use crate::discovery::CacheRoot;
use crate::error::HoldError;
use crate::logging::Logger;
use crate::marker::usage_signal;
use crate::state::{CacheKind, Snapshot};
use crate::timestamp::describe_age;

/// Decision for one cache root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not present in the snapshot; always retained.
    New,
    /// Usage signal advanced since the snapshot; retained.
    Active,
    /// Usage signal did not advance; deleted.
    Stale,
}

/// Classifies a root from its recorded and current usage signals.
///
/// A root is stale when its current signal is not newer than the recorded
/// one. Equal signals are stale.
pub fn classify(recorded: Option<u128>, current: u128) -> Verdict {
    match recorded {
        None => Verdict::New,
        Some(recorded) if current > recorded => Verdict::Active,
        Some(_) => Verdict::Stale,
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct SweepOptions {
    pub dry_run: bool,
    pub prune_empty_dirs: bool,
}

enum Outcome {
    Retained(Verdict),
    Removed { bytes: u64 },
    Failed(SweepFailure),
}

/// Compares `roots` against `snapshot` and deletes what went stale.
///
/// Module, build-cache and version roots are swept in parallel. Wrapper
/// distributions are decided afterwards: one is removed exactly when the
/// version cache it belongs to was removed in this sweep.
pub(crate) fn sweep(
    cache_home: &Path,
    roots: &[CacheRoot],
    snapshot: &Snapshot,
    options: SweepOptions,
    log: Logger,
) -> SweepStats {
    let mut stats = SweepStats {
        dry_run: options.dry_run,
        ..SweepStats::default()
    };

    let (wrappers, independent): (Vec<&CacheRoot>, Vec<&CacheRoot>) = roots
        .iter()
        .partition(|root| root.kind() == CacheKind::WrapperDistCache);

    let outcomes: Vec<(&CacheRoot, Outcome)> = independent
        .par_iter()
        .map(|&root| {
            let recorded = snapshot.get(root.key()).map(|state| state.signal_nanos);
            let current = usage_signal(root, log);
            let verdict = classify(recorded, current);
            log.verbose(
                2,
                format!(
                    "{} {}: recorded {}, now {} -> {verdict:?}",
                    root.kind(),
                    root.key(),
                    recorded.map_or_else(|| "-".to_string(), describe_age),
                    describe_age(current),
                ),
            );
            let outcome = match verdict {
                Verdict::Stale => remove_root(root, options.dry_run, log),
                retained => Outcome::Retained(retained),
            };
            (root, outcome)
        })
        .collect();

    let mut removed_versions = HashSet::new();
    let mut removed_modules = Vec::new();
    for (root, outcome) in outcomes {
        if matches!(outcome, Outcome::Removed { .. }) {
            match root.kind() {
                CacheKind::VersionCache => {
                    removed_versions.extend(root.version_name().map(str::to_string));
                }
                CacheKind::ModuleCache => removed_modules.push(root),
                _ => {}
            }
        }
        tally(&mut stats, root, outcome);
    }

    for root in wrappers {
        let outcome = if !snapshot.contains(root.key()) {
            Outcome::Retained(Verdict::New)
        } else if root
            .version_name()
            .is_some_and(|version| removed_versions.contains(version))
        {
            remove_root(root, options.dry_run, log)
        } else {
            log.verbose(2, format!("{} {}: version retained", root.kind(), root.key()));
            Outcome::Retained(Verdict::Active)
        };
        tally(&mut stats, root, outcome);
    }

    if options.prune_empty_dirs && !options.dry_run {
        stats.pruned_dirs = prune_empty_parents(cache_home, &removed_modules, log);
    }

    stats
}

fn tally(stats: &mut SweepStats, root: &CacheRoot, outcome: Outcome) {
    match outcome {
        Outcome::Retained(Verdict::New) => stats.retained_new += 1,
        Outcome::Retained(_) => stats.retained_active += 1,
        Outcome::Removed { bytes } => {
            stats.removed.add(root.kind());
            stats.bytes_freed += bytes;
        }
        Outcome::Failed(failure) => stats.failures.push(failure),
    }
}

fn remove_root(root: &CacheRoot, dry_run: bool, log: Logger) -> Outcome {
    let bytes = calculate_entry_size(root.path());
    if dry_run {
        log.verbose(1, format!("Would remove {}", root.key()));
        return Outcome::Removed { bytes };
    }

    match remove_entry(root.path()) {
        Ok(()) => {
            log.verbose(1, format!("Removed {}", root.key()));
            Outcome::Removed { bytes }
        }
        Err(source) if source.kind() == ErrorKind::NotFound => {
            log.verbose(1, format!("Already gone: {}", root.key()));
            Outcome::Removed { bytes: 0 }
        }
        Err(source) => {
            let message = source.to_string();
            let err = HoldError::DeleteFailed {
                path: root.path().to_path_buf(),
                source,
            };
            log.warn(format!("{err}: {message}"));
            Outcome::Failed(SweepFailure {
                path: root.path().to_path_buf(),
                message,
            })
        }
    }
}

/// Removes a file or a whole directory tree without following symlinks.
fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Removes artifact and group directories left empty by module deletions.
///
/// Stops at the `files-*` directory. Non-empty directories are left alone.
fn prune_empty_parents(cache_home: &Path, removed: &[&CacheRoot], log: Logger) -> usize {
    let mut candidates: Vec<&Path> = removed
        .iter()
        .filter_map(|root| root.path().parent())
        .flat_map(|artifact| [Some(artifact), artifact.parent()])
        .flatten()
        .filter(|dir| dir.starts_with(cache_home))
        .collect();

    // Deepest first so an artifact is removed before its group is examined.
    candidates.sort_by(|a, b| {
        b.components()
            .count()
            .cmp(&a.components().count())
            .then_with(|| a.cmp(b))
    });
    candidates.dedup();

    candidates
        .into_iter()
        .filter(|dir| match fs::remove_dir(dir) {
            Ok(()) => {
                log.verbose(2, format!("Pruned empty directory {}", dir.display()));
                true
            }
            Err(_) => false,
        })
        .count()
}
