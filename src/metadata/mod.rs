//! Persistence for everything that must survive between the two phases.
//!
//! Both the snapshot and the key/value [`StateStore`] are rkyv archives,
//! loaded through a memory map and written with a temp-file-then-rename
//! sequence so a crash mid-write never leaves a torn file behind.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{HoldError, Result};
use crate::hashing::fingerprint_path;
use crate::logging::Logger;
use crate::state::{SNAPSHOT_VERSION, STATE_STORE_VERSION, Snapshot, StateValues};


/// File name of the state store inside the staging directory.
pub const STATE_STORE_FILE: &str = "state.bin";

/// Location of the snapshot for `cache_home` inside `staging_dir`.
///
/// The file name embeds a fingerprint of the cache home so several homes
/// can share a staging directory.
pub fn snapshot_path(staging_dir: &Path, cache_home: &Path) -> Result<PathBuf> {
    let fingerprint = fingerprint_path(cache_home)?;
    Ok(staging_dir.join(format!("snapshot-{fingerprint}.bin")))
}

/// Loads a snapshot written by a previous `prepare`.
///
/// Returns `Ok(None)` when no snapshot exists, when the file is empty, or
/// when it is corrupt (in which case it is removed so the next cleanup is a
/// clean no-op).
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read, or if it was
/// written by a newer snapshot format.
pub fn load_snapshot(path: &Path, log: Logger) -> Result<Option<Snapshot>> {
    read_snapshot(path, log, true)
}

/// Like [`load_snapshot`], but never touches the file.
///
/// A corrupt snapshot reads as `Ok(None)` and stays where it is.
///
/// # Errors
///
/// Same as [`load_snapshot`].
pub fn peek_snapshot(path: &Path, log: Logger) -> Result<Option<Snapshot>> {
    read_snapshot(path, log, false)
}

fn read_snapshot(path: &Path, log: Logger, discard_corrupt: bool) -> Result<Option<Snapshot>> {
    let Some(mmap) = map_file(path)? else {
        return Ok(None);
    };

    let decoded = rkyv::from_bytes::<Snapshot, rkyv::rancor::BoxedError>(&mmap[..]);
    drop(mmap);

    let snapshot = match decoded {
        Ok(snapshot) => snapshot,
        Err(err) => {
            let err = HoldError::DeserializationError(err);
            if !discard_corrupt {
                log.warn(format!("unreadable snapshot {}: {err}", path.display()));
                return Ok(None);
            }
            log.warn(format!(
                "discarding unreadable snapshot {}: {err}",
                path.display()
            ));
            if let Err(remove_err) = fs::remove_file(path) {
                log.warn(format!("could not remove corrupt snapshot: {remove_err}"));
            }
            return Ok(None);
        }
    };

    if snapshot.version > SNAPSHOT_VERSION {
        return Err(HoldError::ConfigError(format!(
            "Snapshot version {} is newer than supported version {}. Please update gradle-hold.",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }

    Ok(Some(snapshot))
}

/// Saves a snapshot atomically, creating the staging directory if needed.
///
/// # Errors
///
/// Returns [`HoldError::StagingDir`] if the directory cannot be created or
/// the file cannot be written.
pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let bytes = rkyv::to_bytes::<rkyv::rancor::BoxedError>(snapshot)
        .map_err(|e| HoldError::SerializationError(Box::new(e)))?;
    write_atomically(path, &bytes)
}

/// Removes a consumed snapshot.
///
/// Idempotent: a missing file is not an error.
pub fn discard_snapshot(path: &Path) -> Result<()> {
    remove_staging_file(path)
}

fn remove_staging_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(HoldError::StagingDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// File-backed key/value map bridging separate process invocations.
///
/// Every mutation is persisted before it returns, so a later invocation
/// observes exactly what an earlier one set.
///
/// ```no_run
/// use gradle_hold::metadata::StateStore;
///
/// let mut store = StateStore::open("/tmp/gradle-hold/state.bin")?;
/// store.set("build-tool", "wrapper:/work/gradlew")?;
/// assert_eq!(store.get("build-tool"), Some("wrapper:/work/gradlew"));
/// # Ok::<(), gradle_hold::error::HoldError>(())
/// ```
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl StateStore {
    /// Opens the store at `path`, starting empty if the file does not exist
    /// or cannot be decoded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let decoded = match map_file(&path)? {
            Some(mmap) => rkyv::from_bytes::<StateValues, rkyv::rancor::BoxedError>(&mmap[..]).ok(),
            None => None,
        };

        let values = match decoded {
            Some(stored) if stored.version > STATE_STORE_VERSION => {
                return Err(HoldError::ConfigError(format!(
                    "State store version {} is newer than supported version {}.",
                    stored.version, STATE_STORE_VERSION
                )));
            }
            Some(stored) => stored.values,
            None => HashMap::new(),
        };

        Ok(Self { path, values })
    }

    /// Opens the store that lives in `staging_dir`.
    pub fn in_staging_dir(staging_dir: &Path) -> Result<Self> {
        Self::open(staging_dir.join(STATE_STORE_FILE))
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Stores `value` under `key` and persists the store.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.values.insert(key.into(), value.into());
        self.persist()
    }

    /// Deletes the backing file and forgets every value.
    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        remove_staging_file(&self.path)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let stored = StateValues {
            version: STATE_STORE_VERSION,
            values: self.values.clone(),
        };
        let bytes = rkyv::to_bytes::<rkyv::rancor::BoxedError>(&stored)
            .map_err(|e| HoldError::SerializationError(Box::new(e)))?;
        write_atomically(&self.path, &bytes)
    }
}

/// Memory-maps `path`, returning `None` if it is missing or empty.
fn map_file(path: &Path) -> Result<Option<Mmap>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(HoldError::IoError {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let len = file
        .metadata()
        .map_err(|source| HoldError::IoError {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if len == 0 {
        return Ok(None);
    }

    let mmap = unsafe { Mmap::map(&file) }.map_err(|source| HoldError::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Some(mmap))
}

/// Writes `bytes` to a sibling temp file, syncs it, and renames it over
/// `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let staging_error = |path: &Path, source| HoldError::StagingDir {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| staging_error(parent, source))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut temp_file = File::create(&temp_path).map_err(|source| staging_error(&temp_path, source))?;
    temp_file
        .write_all(bytes)
        .map_err(|source| staging_error(&temp_path, source))?;
    temp_file
        .sync_all()
        .map_err(|source| staging_error(&temp_path, source))?;

    fs::rename(&temp_path, path).map_err(|source| staging_error(path, source))?;

    Ok(())
}
