//! # gradle-hold
//!
//! A CI tool that trims a Gradle user home down to what the last build
//! actually used, before the CI system archives and re-uploads it.
//!
//! ## Overview
//!
//! Gradle caches grow without bound across CI runs: every dependency
//! version, build cache entry, and Gradle distribution ever used stays in
//! the archive. gradle-hold removes what the current build did not touch,
//! using only the usage signals Gradle itself leaves on disk.
//!
//! The collector runs in two separate processes around the build:
//!
//! 1. `prepare` records a snapshot of every cache entry's usage signal into a
//!    staging directory.
//! 2. The build runs and touches what it uses.
//! 3. `cleanup` deletes every entry whose signal did not advance.
//!
//! ## Key Features
//!
//! - **Four cache categories**: dependency versions, build cache entries,
//!   Gradle version caches, and wrapper distributions
//! - **Never deletes new entries**: anything created after `prepare` is kept
//! - **Crash-safe snapshots**: rkyv archives written with temp file + rename
//! - **Best-effort sweeping**: a delete failure on one entry never stops the
//!   rest
//! - **Parallel processing**: rayon for signal reading and deletion
//!
//! ## Architecture
//!
//! - [`cli`]: Command-line interface definitions using clap
//! - [`commands`]: Implementation of all gradle-hold subcommands
//! - [`error`]: Error types and handling with thiserror + miette
//! - [`gc`]: The two-phase [`CacheCleaner`](gc::CacheCleaner)
//! - [`discovery`]: Enumeration of cache roots under a cache home
//! - [`metadata`]: Persistence of snapshots and the cross-process state store
//! - [`state`]: The snapshot data model
//! - [`tool`]: The build tool run between the phases
//!
//! Internal modules:
//! - `marker`: Reading usage markers and computing usage signals
//! - `timestamp`: Filesystem time conversions
//! - `hashing`: BLAKE3 fingerprints for staging file names
//!
//! ## Usage in CI
//!
//! ```bash
//! gradle-hold prepare
//! ./gradlew build
//! gradle-hold cleanup
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use gradle_hold::cli::{Cli, Commands};
//! use gradle_hold::commands;
//!
//! let cli = Cli::builder()
//!     .cache_home("/home/ci/.gradle")
//!     .verbose(1)
//!     .command(Commands::Prepare)
//!     .build()?;
//!
//! commands::execute(&cli)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Only configuration problems (missing cache home, unusable staging
//! directory) fail a phase. Unreadable markers and failed deletions are
//! logged and the phase carries on.

pub mod cli;
pub mod commands;
pub mod discovery;
pub mod error;
pub mod gc;
pub mod logging;
pub mod metadata;
pub mod state;
pub mod tool;

// Internal modules
mod hashing;
mod marker;
mod timestamp;
