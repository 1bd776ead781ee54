//! Enumeration of the cache roots under a Gradle user home.
//!
//! Four categories are recognized:
//!
//! | Kind | Layout |
//! |------|--------|
//! | module | `caches/modules-2/files-*/<group>/<artifact>/<version>/` |
//! | build-cache | `caches/build-cache-<n>/<32 hex chars>` |
//! | version | `caches/<tool-version>/` |
//! | wrapper-dist | `wrapper/dists/gradle-<tool-version>-<bin\|all>/` |
//!
//! Discovery is lazy: directories are only read as the returned iterator is
//! driven. Missing category directories contribute nothing, unreadable ones
//! are skipped with a warning.

use std::fs::{self, FileType};
use std::io::ErrorKind;
use std::iter;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::logging::Logger;
use crate::state::CacheKind;


const CACHES_DIR: &str = "caches";
const MODULES_DIR: &str = "modules-2";
const WRAPPER_DISTS_DIR: [&str; 2] = ["wrapper", "dists"];

/// Depth of `<group>/<artifact>/<version>` below a `files-*` directory.
const MODULE_VERSION_DEPTH: usize = 3;

/// One discovered cache root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRoot {
    kind: CacheKind,
    path: PathBuf,
    key: String,
    marker: Option<PathBuf>,
    version: Option<String>,
}

impl CacheRoot {
    /// A dependency version directory.
    pub fn module(path: PathBuf, key: impl Into<String>) -> Self {
        Self {
            kind: CacheKind::ModuleCache,
            path,
            key: key.into(),
            marker: None,
            version: None,
        }
    }

    /// A build result blob.
    pub fn build_blob(path: PathBuf, key: impl Into<String>) -> Self {
        Self {
            kind: CacheKind::BuildCache,
            path,
            key: key.into(),
            marker: None,
            version: None,
        }
    }

    /// A per-version install tree carrying a usage marker.
    pub fn version(
        path: PathBuf,
        key: impl Into<String>,
        version: impl Into<String>,
        marker: PathBuf,
    ) -> Self {
        Self {
            kind: CacheKind::VersionCache,
            path,
            key: key.into(),
            marker: Some(marker),
            version: Some(version.into()),
        }
    }

    /// A wrapper distribution directory for `version`.
    pub fn wrapper_dist(path: PathBuf, key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            kind: CacheKind::WrapperDistCache,
            path,
            key: key.into(),
            marker: None,
            version: Some(version.into()),
        }
    }

    pub fn kind(&self) -> CacheKind {
        self.kind
    }

    /// Absolute path of the deletable entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stable identity: the path relative to the cache home, `/`-separated.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn marker(&self) -> Option<&Path> {
        self.marker.as_deref()
    }

    /// Tool version this root belongs to (version caches and wrapper
    /// distributions only).
    pub fn version_name(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

/// Lazily discovers every cache root under `cache_home`.
///
/// The sequence is finite and can be consumed once; call again for a fresh
/// scan.
pub fn discover_roots<'a>(
    cache_home: &'a Path,
    marker_file_name: &'a str,
    log: Logger,
) -> impl Iterator<Item = CacheRoot> + 'a {
    module_roots(cache_home, log)
        .chain(build_cache_roots(cache_home, log))
        .chain(version_roots(cache_home, marker_file_name, log))
        .chain(wrapper_dist_roots(cache_home, log))
}

fn module_roots(cache_home: &Path, log: Logger) -> impl Iterator<Item = CacheRoot> + '_ {
    let modules = cache_home.join(CACHES_DIR).join(MODULES_DIR);
    list_dir(modules, log)
        .filter(|listed| listed.file_type.is_dir() && listed.name.starts_with("files-"))
        .flat_map(move |files_dir| {
            WalkDir::new(&files_dir.path)
                .min_depth(MODULE_VERSION_DEPTH)
                .max_depth(MODULE_VERSION_DEPTH)
                .follow_links(false)
                .into_iter()
                .filter_map(move |entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        log.warn(format!("skipping unreadable module cache entry: {err}"));
                        None
                    }
                })
        })
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(move |entry| {
            let path = entry.into_path();
            let key = relative_key(cache_home, &path, log)?;
            Some(CacheRoot::module(path, key))
        })
}

fn build_cache_roots(cache_home: &Path, log: Logger) -> impl Iterator<Item = CacheRoot> + '_ {
    list_dir(cache_home.join(CACHES_DIR), log)
        .filter(|listed| listed.file_type.is_dir() && build_cache_dir_re().is_match(&listed.name))
        .flat_map(move |build_cache| list_dir(build_cache.path, log))
        .filter(|listed| listed.file_type.is_file() && blob_name_re().is_match(&listed.name))
        .filter_map(move |blob| {
            let key = relative_key(cache_home, &blob.path, log)?;
            Some(CacheRoot::build_blob(blob.path, key))
        })
}

fn version_roots<'a>(
    cache_home: &'a Path,
    marker_file_name: &'a str,
    log: Logger,
) -> impl Iterator<Item = CacheRoot> + 'a {
    list_dir(cache_home.join(CACHES_DIR), log)
        .filter(|listed| listed.file_type.is_dir() && version_re().is_match(&listed.name))
        .filter_map(move |listed| {
            let key = relative_key(cache_home, &listed.path, log)?;
            let marker = listed.path.join(marker_file_name);
            Some(CacheRoot::version(listed.path, key, listed.name, marker))
        })
}

fn wrapper_dist_roots(cache_home: &Path, log: Logger) -> impl Iterator<Item = CacheRoot> + '_ {
    let dists = WRAPPER_DISTS_DIR
        .iter()
        .fold(cache_home.to_path_buf(), |dir, part| dir.join(part));
    list_dir(dists, log)
        .filter(|listed| listed.file_type.is_dir())
        .filter_map(move |listed| {
            let version = wrapper_dist_version(&listed.name)?.to_string();
            let key = relative_key(cache_home, &listed.path, log)?;
            Some(CacheRoot::wrapper_dist(listed.path, key, version))
        })
}

/// Extracts the tool version from a wrapper distribution directory name,
/// e.g. `gradle-7.3.3-bin` -> `7.3.3`.
pub fn wrapper_dist_version(name: &str) -> Option<&str> {
    wrapper_dist_re()
        .captures(name)
        .and_then(|captures| captures.get(1))
        .map(|version| version.as_str())
}

/// Whether `name` looks like a per-version cache directory name.
pub fn is_version_name(name: &str) -> bool {
    version_re().is_match(name)
}

struct Listed {
    path: PathBuf,
    name: String,
    file_type: FileType,
}

/// Lazily lists the children of `dir` that have UTF-8 names.
///
/// The directory is not opened until the iterator is first polled.
fn list_dir(dir: PathBuf, log: Logger) -> impl Iterator<Item = Listed> {
    iter::once(dir).flat_map(move |dir| {
        let reader = match fs::read_dir(&dir) {
            Ok(reader) => Some(reader),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                log.warn(format!("skipping unreadable directory {}: {err}", dir.display()));
                None
            }
        };

        reader.into_iter().flatten().filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log.warn(format!("skipping unreadable directory entry: {err}"));
                    return None;
                }
            };
            let path = entry.path();
            let Ok(name) = entry.file_name().into_string() else {
                log.warn(format!("skipping non UTF-8 name {}", path.display()));
                return None;
            };
            let file_type = entry.file_type().ok()?;
            Some(Listed {
                path,
                name,
                file_type,
            })
        })
    })
}

/// `path` relative to `cache_home`, joined with `/`.
fn relative_key(cache_home: &Path, path: &Path, log: Logger) -> Option<String> {
    let relative = path.strip_prefix(cache_home).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        let Some(part) = component.as_os_str().to_str() else {
            log.warn(format!("skipping non UTF-8 path {}", path.display()));
            return None;
        };
        parts.push(part);
    }
    Some(parts.join("/"))
}

fn build_cache_dir_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^build-cache-\d+$").expect("build cache regex should compile"))
}

fn blob_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-f]{32}$").expect("blob name regex should compile"))
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d+(\.\d+)+(-[0-9A-Za-z][0-9A-Za-z.-]*)?$")
            .expect("version regex should compile")
    })
}

fn wrapper_dist_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^gradle-(\d+(?:\.\d+)+(?:-[0-9A-Za-z][0-9A-Za-z.-]*)?)-(?:bin|all)$")
            .expect("wrapper distribution regex should compile")
    })
}
