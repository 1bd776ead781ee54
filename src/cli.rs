//! Command-line interface definitions for gradle-hold.
//!
//! This module defines the CLI structure using clap, including all subcommands
//! and their arguments. The main entry point is the [`Cli`] struct.
//!
//! # Example
//!
//! ```no_run
//! use gradle_hold::cli::{Cli, Commands};
//!
//! let cli = Cli::parse_args();
//!
//! match cli.command() {
//!     Commands::Prepare => println!("Recording cache usage"),
//!     Commands::Cleanup { dry_run, .. } => println!("Cleaning (dry run: {dry_run})"),
//!     _ => {}
//! }
//! ```

use std::path::{Component, Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::{HoldError, Result};
use crate::gc::CacheCleaner;


/// Directory name used for the default staging directory under the system
/// temp dir.
const DEFAULT_STAGING_DIR_NAME: &str = "gradle-hold";

/// Main command-line interface for gradle-hold.
///
/// Global options apply to every subcommand and may appear anywhere on the
/// command line.
#[derive(Parser)]
#[command(
    name = "gradle-hold",
    bin_name = "gradle-hold",
    author,
    version,
    about = "A CI tool that trims a Gradle user home down to what the last build actually used",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    global_opts: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

/// Global options that apply to all gradle-hold commands.
#[derive(Parser)]
pub struct GlobalOpts {
    /// Gradle user home to clean (defaults to ~/.gradle)
    #[arg(long, global = true, env = "GRADLE_USER_HOME")]
    cache_home: Option<PathBuf>,

    /// Directory holding state between `prepare` and `cleanup` (defaults to
    /// `<system temp>/gradle-hold`)
    #[arg(long, global = true, env = "GRADLE_HOLD_STAGING_DIR")]
    staging_dir: Option<PathBuf>,

    /// Enable verbose output (use multiple times for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count, env = "GRADLE_HOLD_VERBOSE")]
    verbose: u8,

    /// Silence all output except for errors
    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        env = "GRADLE_HOLD_QUIET"
    )]
    quiet: bool,
}

impl GlobalOpts {
    /// Create a new builder for constructing `GlobalOpts` programmatically.
    pub fn builder() -> GlobalOptsBuilder {
        GlobalOptsBuilder::default()
    }

    /// Get the absolute cache home, falling back to `~/.gradle`.
    ///
    /// # Errors
    ///
    /// Returns [`HoldError::ConfigError`] if no cache home was given and the
    /// user's home directory cannot be determined.
    pub fn get_cache_home(&self) -> Result<PathBuf> {
        match self.cache_home() {
            Some(path) => Ok(normalize_path(path)),
            None => home::home_dir()
                .map(|home| normalize_path(home.join(".gradle")))
                .ok_or_else(|| {
                    HoldError::ConfigError(
                        "Could not determine home directory; pass --cache-home".to_string(),
                    )
                }),
        }
    }

    /// Get the absolute staging directory, falling back to
    /// `<system temp>/gradle-hold`.
    pub fn get_staging_dir(&self) -> PathBuf {
        let path = self
            .staging_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_STAGING_DIR_NAME));

        normalize_path(path)
    }

    /// Builds a [`CacheCleaner`] from these options.
    pub fn cleaner(&self, dry_run: bool, prune_empty_dirs: bool) -> Result<CacheCleaner> {
        CacheCleaner::builder()
            .cache_home(self.get_cache_home()?)
            .staging_dir(self.get_staging_dir())
            .dry_run(dry_run)
            .prune_empty_dirs(prune_empty_dirs)
            .verbose(self.verbose())
            .quiet(self.quiet())
            .build()
    }

    /// Get the cache home option
    pub fn cache_home(&self) -> Option<&Path> {
        self.cache_home.as_deref()
    }

    /// Get the staging directory option
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging_dir.as_deref()
    }

    /// Get the verbose level
    pub fn verbose(&self) -> u8 {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn quiet(&self) -> bool {
        self.quiet
    }
}

/// Builder for constructing `GlobalOpts` programmatically.
///
/// Useful for tests and for embedding gradle-hold without going through
/// argument parsing.
#[derive(Default)]
pub struct GlobalOptsBuilder {
    cache_home: Option<PathBuf>,
    staging_dir: Option<PathBuf>,
    verbose: u8,
    quiet: bool,
}

impl GlobalOptsBuilder {
    /// Set the cache home.
    pub fn cache_home(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.cache_home = path.map(|p| p.into());
        self
    }

    /// Set the staging directory.
    pub fn staging_dir(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.staging_dir = path.map(|p| p.into());
        self
    }

    /// Set the verbosity level (0 = normal, 1+ = verbose).
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable or disable quiet mode.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Build the `GlobalOpts` instance with the configured values.
    pub fn build(self) -> GlobalOpts {
        GlobalOpts {
            cache_home: self.cache_home,
            staging_dir: self.staging_dir,
            verbose: self.verbose,
            quiet: self.quiet,
        }
    }
}

impl Cli {
    /// Get the global options
    pub fn global_opts(&self) -> &GlobalOpts {
        &self.global_opts
    }

    /// Get the command
    pub fn command(&self) -> &Commands {
        &self.command
    }

    /// Create a builder for programmatic construction
    pub fn builder() -> CliBuilder {
        CliBuilder::default()
    }

    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Builder for [`Cli`]
#[derive(Debug, Default)]
pub struct CliBuilder {
    cache_home: Option<PathBuf>,
    staging_dir: Option<PathBuf>,
    verbose: u8,
    quiet: bool,
    command: Option<Commands>,
}

impl CliBuilder {
    /// Set the cache home
    pub fn cache_home(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_home = Some(path.into());
        self
    }

    /// Set the staging directory
    pub fn staging_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(path.into());
        self
    }

    /// Set the verbose level
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Enable quiet mode
    pub fn quiet(mut self, enabled: bool) -> Self {
        self.quiet = enabled;
        self
    }

    /// Set the command
    pub fn command(mut self, command: Commands) -> Self {
        self.command = Some(command);
        self
    }

    /// Build the Cli instance
    pub fn build(self) -> Result<Cli> {
        let command = self
            .command
            .ok_or_else(|| HoldError::ConfigError("Command is required".to_string()))?;

        Ok(Cli {
            global_opts: GlobalOpts::builder()
                .cache_home(self.cache_home)
                .staging_dir(self.staging_dir)
                .verbose(self.verbose)
                .quiet(self.quiet)
                .build(),
            command,
        })
    }
}

/// Normalize a path to be absolute and clean, without requiring it to exist.
///
/// Relative paths are joined onto the current directory and `.`/`..`
/// components are resolved lexically. Symlinks are not resolved.
pub(crate) fn normalize_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    let absolute = if path.is_relative() {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    } else {
        path.to_path_buf()
    };

    let mut components = Vec::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                if let Some(last) = components.last()
                    && !matches!(last, Component::ParentDir | Component::RootDir)
                {
                    components.pop();
                    continue;
                }
                components.push(component);
            }
            Component::CurDir => continue,
            _ => components.push(component),
        }
    }

    components.into_iter().collect()
}

/// Available gradle-hold subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record which cache entries exist and when they were last used
    ///
    /// Run this before the build. It scans the Gradle user home and writes a
    /// snapshot of every cache entry's usage signal to the staging
    /// directory. Nothing is deleted. Running it again refreshes the
    /// snapshot.
    Prepare,

    /// Delete cache entries the build did not use
    ///
    /// Run this after the build, before the cache is archived. Every entry
    /// recorded by `prepare` whose usage signal has not advanced is deleted:
    /// - Dependency versions under caches/modules-2
    /// - Build cache entries under caches/build-cache-<n>
    /// - Whole Gradle version caches under caches/<version>
    /// - Wrapper distributions of deleted versions
    ///
    /// Entries created during the build are always kept. The snapshot is
    /// consumed, so running cleanup twice is harmless.
    Cleanup {
        /// Show what would be deleted without actually deleting
        #[arg(long, env = "GRADLE_HOLD_DRY_RUN")]
        dry_run: bool,

        /// Keep group/artifact directories left empty by deletions
        #[arg(long, env = "GRADLE_HOLD_NO_PRUNE")]
        no_prune: bool,
    },

    /// Run the build with the cache home wired in
    ///
    /// Uses --executable when given, otherwise the gradlew script in the
    /// build root. The resolved tool is recorded in the staging directory.
    Build {
        /// Build tool executable (a path, or a name looked up on PATH)
        #[arg(long, env = "GRADLE_HOLD_EXECUTABLE")]
        executable: Option<PathBuf>,

        /// Directory to run the build in
        #[arg(long, default_value = ".", env = "GRADLE_HOLD_BUILD_ROOT")]
        build_root: PathBuf,

        /// Arguments passed to the build tool
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Show whether a snapshot is waiting to be swept
    Status,

    /// Discard the snapshot and recorded state
    ///
    /// The next cleanup becomes a no-op until `prepare` runs again.
    Reset,
}
