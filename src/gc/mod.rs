//! Two-phase garbage collection for a Gradle user home.
//!
//! [`CacheCleaner::prepare`] records the usage signal of every cache root
//! into a snapshot in the staging directory. The build then runs as a
//! separate process and touches what it uses. [`CacheCleaner::force_cleanup`]
//! re-reads the signals and deletes every entry whose signal did not advance:
//!
//! - dependency versions under `caches/modules-2/files-*`
//! - build cache blobs under `caches/build-cache-<n>`
//! - whole tool version caches under `caches/<version>`
//! - wrapper distributions whose version cache was deleted in the same sweep
//!
//! Entries that did not exist at `prepare` time are always kept, and a
//! delete failure on one entry never stops the others.
//!
//! # Example
//!
//! ```no_run
//! use gradle_hold::gc::CacheCleaner;
//!
//! let cleaner = CacheCleaner::builder()
//!     .cache_home("/home/ci/.gradle")
//!     .staging_dir("/tmp/gradle-hold")
//!     .build()?;
//!
//! cleaner.prepare()?;
//! // ... run the build ...
//! let stats = cleaner.force_cleanup()?;
//! println!("Freed {} bytes", stats.bytes_freed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
mod size;
mod stats;
mod sweep;

pub use config::{CacheCleaner, CacheCleanerBuilder, DEFAULT_MARKER_FILE_NAME};
pub(crate) use size::format_size;
pub use stats::{CategoryCounts, CleanerState, PrepareStats, SweepFailure, SweepStats};
pub use sweep::{Verdict, classify};
