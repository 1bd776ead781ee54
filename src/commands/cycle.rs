//! Prepare, cleanup, status, and reset command implementations.

use crate::cli::GlobalOpts;
use crate::error::Result;
use crate::gc::{CleanerState, PrepareStats, SweepStats, format_size};
use crate::logging::Logger;
use crate::metadata::StateStore;
use crate::state::CacheKind;
use crate::tool::{BUILD_TOOL_KEY, BuildTool};

/// Executes the prepare command.
///
/// Records the usage signal of every cache root so a later cleanup can tell
/// what the build touched.
pub fn prepare(opts: &GlobalOpts) -> Result<PrepareStats> {
    let log = Logger::new(opts.verbose(), opts.quiet());
    let cleaner = opts.cleaner(false, true)?;

    log.verbose(1, "Preparing cache cleanup...");
    let stats = cleaner.prepare()?;

    log.info(format!(
        "Recorded {} cache entries in {}",
        stats.recorded.total(),
        cleaner.cache_home().display()
    ));
    for kind in CacheKind::ALL {
        log.verbose(
            1,
            format!("  {}: {}", kind.label(), stats.recorded.get(kind)),
        );
    }

    Ok(stats)
}

/// Executes the cleanup command.
///
/// Delete failures are reported as warnings; they never fail the command.
pub fn cleanup(opts: &GlobalOpts, dry_run: bool, no_prune: bool) -> Result<SweepStats> {
    let log = Logger::new(opts.verbose(), opts.quiet());
    let cleaner = opts.cleaner(dry_run, !no_prune)?;

    log.verbose(1, "Cleaning up unused cache entries...");
    let stats = cleaner.force_cleanup()?;
    if !stats.skipped {
        report(&stats, log);
    }

    Ok(stats)
}

fn report(stats: &SweepStats, log: Logger) {
    let verb = if stats.dry_run { "Would remove" } else { "Removed" };
    log.info(format!(
        "{verb} {} unused cache entries ({}), kept {}",
        stats.removed.total(),
        format_size(stats.bytes_freed),
        stats.retained()
    ));
    for kind in CacheKind::ALL {
        let count = stats.removed.get(kind);
        if count > 0 {
            log.info(format!("  {}: {count}", kind.label()));
        }
    }
    log.verbose(
        1,
        format!(
            "  kept {} in use, {} created since prepare",
            stats.retained_active, stats.retained_new
        ),
    );
    if stats.pruned_dirs > 0 {
        log.verbose(1, format!("  pruned {} empty directories", stats.pruned_dirs));
    }
    if !stats.failures.is_empty() {
        log.warn(format!(
            "{} entries could not be removed and were left in place",
            stats.failures.len()
        ));
        for failure in &stats.failures {
            log.verbose(1, format!("  {}: {}", failure.path.display(), failure.message));
        }
    }
}

/// Executes the status command.
pub fn status(opts: &GlobalOpts) -> Result<CleanerState> {
    let log = Logger::new(opts.verbose(), opts.quiet());
    let cleaner = opts.cleaner(false, true)?;
    let state = cleaner.state()?;

    log.info(format!("Cache home: {}", cleaner.cache_home().display()));
    log.info(format!("State: {state}"));
    if let CleanerState::Prepared { recorded, .. } = state {
        for kind in CacheKind::ALL {
            log.verbose(1, format!("  {}: {}", kind.label(), recorded.get(kind)));
        }
    }

    let store = StateStore::in_staging_dir(cleaner.staging_dir())?;
    if let Some(record) = store.get(BUILD_TOOL_KEY) {
        match record.parse::<BuildTool>() {
            Ok(tool) => log.info(format!("Last build tool: {tool}")),
            Err(err) => log.warn(err),
        }
    }

    Ok(state)
}

/// Executes the reset command.
///
/// Removes this cache home's snapshot and the recorded state.
pub fn reset(opts: &GlobalOpts) -> Result<()> {
    let log = Logger::new(opts.verbose(), opts.quiet());
    let cleaner = opts.cleaner(false, true)?;

    cleaner.reset()?;
    let mut store = StateStore::in_staging_dir(cleaner.staging_dir())?;
    store.clear()?;

    log.info("Discarded snapshot and recorded state");
    Ok(())
}
