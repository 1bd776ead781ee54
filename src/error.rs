//! Error types for gradle-hold.
//!
//! Errors are defined with `thiserror` and carry `miette` diagnostics so the
//! CLI can render codes and help text.
//!
//! # Error Handling Strategy
//!
//! Only configuration problems abort a phase:
//! [`HoldError::CacheHomeNotFound`], [`HoldError::StagingDir`] and
//! [`HoldError::ConfigError`]. Marker read failures
//! ([`HoldError::MarkerUnreadable`]) and per-entry delete failures
//! ([`HoldError::DeleteFailed`]) are constructed so they can be logged and
//! reported, but the sweep never propagates them.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use gradle_hold::error::{HoldError, Result};
//!
//! fn check_home(path: &Path) -> Result<()> {
//!     if !path.is_dir() {
//!         return Err(HoldError::CacheHomeNotFound(path.to_path_buf()));
//!     }
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error types that can occur in gradle-hold operations
#[derive(Error, Debug, Diagnostic)]
pub enum HoldError {
    /// The cache home directory does not exist or is not a directory.
    ///
    /// Both phases refuse to run against a missing cache home: `prepare`
    /// would record an empty snapshot and `cleanup` would have nothing to
    /// compare against.
    #[error("Cache home '{0}' does not exist or is not a directory")]
    #[diagnostic(
        code(gradle_hold::config::cache_home_not_found),
        help("Point --cache-home (or GRADLE_USER_HOME) at the Gradle user home to clean.")
    )]
    CacheHomeNotFound(
        /// The configured cache home
        PathBuf,
    ),

    /// The staging directory could not be created or written.
    ///
    /// The snapshot that bridges `prepare` and `cleanup` lives here, so an
    /// unusable staging directory aborts the phase.
    #[error("Staging directory '{path}' is not usable")]
    #[diagnostic(
        code(gradle_hold::config::staging_dir),
        help("Ensure the staging directory is writable and not located on a read-only mount.")
    )]
    StagingDir {
        /// The staging directory (or file inside it) that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// File system I/O error outside of the sweep.
    #[error("I/O error accessing '{path}'")]
    #[diagnostic(code(gradle_hold::io_error))]
    IoError {
        /// The path that caused the I/O error
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A usage marker exists but could not be read or parsed.
    ///
    /// Never fatal: the root is treated as never used and the directory
    /// mtime decides.
    #[error("Unreadable usage marker '{path}': {reason}")]
    #[diagnostic(code(gradle_hold::marker::unreadable))]
    MarkerUnreadable {
        /// The marker file
        path: PathBuf,
        /// Why the marker was rejected
        reason: String,
    },

    /// Deleting a stale cache entry failed.
    ///
    /// Never fatal: recorded in the sweep statistics and the sweep moves on
    /// to the next entry.
    #[error("Failed to delete '{path}'")]
    #[diagnostic(code(gradle_hold::gc::delete_failed))]
    DeleteFailed {
        /// The entry that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize a snapshot or state store with rkyv.
    #[error("Failed to serialize staging data")]
    #[diagnostic(
        code(gradle_hold::staging::serialization_error),
        help("An internal error occurred. Run 'gradle-hold reset' and prepare again.")
    )]
    SerializationError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Failed to deserialize a snapshot or state store.
    ///
    /// Loaders recover from this by discarding the corrupt file.
    #[error("Failed to deserialize staging data: {0}")]
    #[diagnostic(
        code(gradle_hold::staging::deserialization_error),
        help("The staging file may be corrupted. Run 'gradle-hold reset' to discard it.")
    )]
    DeserializationError(
        /// The underlying deserialization error
        #[source]
        rkyv::rancor::BoxedError,
    ),

    /// No build tool could be resolved or it is not runnable.
    #[error("Build tool '{0}' is missing or not executable")]
    #[diagnostic(
        code(gradle_hold::build::tool_not_found),
        help("Pass --executable, or run from a directory containing a gradlew script.")
    )]
    BuildToolNotFound(
        /// The candidate path
        PathBuf,
    ),

    /// The build tool ran but exited unsuccessfully.
    #[error("Build failed: '{tool}' exited with {status}")]
    #[diagnostic(
        code(gradle_hold::build::failed),
        help("See the build output above for details.")
    )]
    BuildFailed {
        /// The tool that was executed
        tool: PathBuf,
        /// Exit status description
        status: String,
    },

    /// Configuration or staging data is invalid.
    ///
    /// Raised for missing builder fields and for staging files written by a
    /// newer gradle-hold.
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(gradle_hold::config::error),
        help("Check the required configuration parameters.")
    )]
    ConfigError(
        /// Description of the configuration error
        String,
    ),

    /// A path cannot be represented as UTF-8.
    #[error("Invalid UTF-8 in path: {0}")]
    #[diagnostic(
        code(gradle_hold::path::invalid_utf8),
        help("Snapshot keys and staging paths must be valid UTF-8.")
    )]
    InvalidUtf8Path(
        /// The offending path
        PathBuf,
    ),
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, HoldError>;
