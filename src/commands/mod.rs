//! Implementation of gradle-hold subcommands.
//!
//! `mod.rs` is a thin dispatcher and re-export hub; command logic lives in
//! `cycle` (prepare, cleanup, status, reset) and `build`.

use std::path::{Path, PathBuf};

use crate::cli::{Cli, Commands};
use crate::error::{HoldError, Result};

pub(crate) mod build;
pub(crate) mod cycle;

pub use build::{Build, BuildBuilder};
pub use cycle::{cleanup, prepare, reset, status};

#[cfg(test)]
mod tests;

/// Execute commands based on the parsed CLI arguments.
pub fn execute(cli: &Cli) -> Result<()> {
    execute_with_dir(cli, None)
}

/// Execute commands with an explicit working directory.
///
/// The working directory only affects how a relative `--build-root` and
/// `--executable` are resolved.
pub fn execute_with_dir(cli: &Cli, working_dir: Option<&Path>) -> Result<()> {
    let opts = cli.global_opts();
    let quiet = opts.quiet();
    let verbose = if quiet { 0 } else { opts.verbose() };

    match cli.command() {
        Commands::Prepare => prepare(opts).map(drop),
        Commands::Cleanup { dry_run, no_prune } => cleanup(opts, *dry_run, *no_prune).map(drop),
        Commands::Status => status(opts).map(drop),
        Commands::Reset => reset(opts),
        Commands::Build {
            executable,
            build_root,
            args,
        } => {
            let current_dir = match working_dir {
                Some(dir) => dir.to_path_buf(),
                None => std::env::current_dir().map_err(|source| HoldError::IoError {
                    path: PathBuf::from("."),
                    source,
                })?,
            };
            let cache_home = opts.get_cache_home()?;
            let staging_dir = opts.get_staging_dir();

            Build::builder()
                .cache_home(&cache_home)
                .staging_dir(&staging_dir)
                .executable(executable.as_deref())
                .build_root(build_root)
                .working_dir(&current_dir)
                .args(args)
                .verbose(verbose)
                .quiet(quiet)
                .build()?
                .run()
                .map(drop)
        }
    }
}
