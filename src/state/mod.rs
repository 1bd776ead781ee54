use std::collections::HashMap;
use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};

use crate::timestamp::now_nanos;

#[cfg(test)]
mod tests;

/// Current version of the snapshot format.
///
/// Snapshots written by a newer gradle-hold are refused rather than
/// misread.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Current version of the state store format.
pub const STATE_STORE_VERSION: u32 = 1;

/// The category a cache root belongs to.
///
/// Each category has its own usage signal and deletion granularity.
#[derive(Archive, Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// `caches/modules-2/files-*/<group>/<artifact>/<version>/`
    ModuleCache,
    /// `caches/build-cache-<n>/<hash>`
    BuildCache,
    /// `caches/<tool-version>/`
    VersionCache,
    /// `wrapper/dists/gradle-<tool-version>-<type>/`
    WrapperDistCache,
}

impl CacheKind {
    /// All kinds, in the order they are reported.
    pub const ALL: [CacheKind; 4] = [
        CacheKind::ModuleCache,
        CacheKind::BuildCache,
        CacheKind::VersionCache,
        CacheKind::WrapperDistCache,
    ];

    /// Human-readable plural label used in summaries.
    pub fn label(self) -> &'static str {
        match self {
            CacheKind::ModuleCache => "dependency versions",
            CacheKind::BuildCache => "build cache entries",
            CacheKind::VersionCache => "tool version caches",
            CacheKind::WrapperDistCache => "wrapper distributions",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CacheKind::ModuleCache => "module",
            CacheKind::BuildCache => "build-cache",
            CacheKind::VersionCache => "version",
            CacheKind::WrapperDistCache => "wrapper-dist",
        };
        f.write_str(name)
    }
}

/// The usage signal observed for one cache root at `prepare` time.
#[derive(Archive, Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct RootState {
    /// Category of the root; kept so summaries survive the process boundary.
    pub kind: CacheKind,

    /// Usage signal in nanoseconds since UNIX_EPOCH. Zero means the root
    /// carried no readable signal.
    pub signal_nanos: u128,
}

/// Point-in-time capture of every cache root's usage signal.
///
/// Written by `prepare`, read and discarded by `cleanup`. Keys are paths
/// relative to the cache home using `/` separators, so they are stable
/// across the two process invocations.
#[derive(Archive, Deserialize, Serialize, Debug, Clone)]
pub struct Snapshot {
    /// Version of the snapshot format.
    pub version: u32,

    /// Canonical cache home the snapshot was taken from.
    ///
    /// `cleanup` refuses to apply a snapshot recorded for another home.
    pub cache_home: String,

    /// When the snapshot was captured, in nanoseconds since UNIX_EPOCH.
    pub captured_at_nanos: u128,

    /// Root key to recorded usage signal.
    pub roots: HashMap<String, RootState>,
}

impl Snapshot {
    /// Creates an empty snapshot for `cache_home`, stamped with the current
    /// time.
    pub fn new(cache_home: impl Into<String>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            cache_home: cache_home.into(),
            captured_at_nanos: now_nanos(),
            roots: HashMap::new(),
        }
    }

    /// Records (or refreshes) the signal for `key`.
    pub fn record(&mut self, key: impl Into<String>, kind: CacheKind, signal_nanos: u128) {
        self.roots.insert(key.into(), RootState { kind, signal_nanos });
    }

    /// Recorded state for `key`, if the root existed at capture time.
    pub fn get(&self, key: &str) -> Option<&RootState> {
        self.roots.get(key)
    }

    /// Whether `key` was present at capture time.
    pub fn contains(&self, key: &str) -> bool {
        self.roots.contains_key(key)
    }

    /// Number of roots recorded for `kind`.
    pub fn count_of(&self, kind: CacheKind) -> usize {
        self.roots.values().filter(|state| state.kind == kind).count()
    }

    /// Returns the number of recorded roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Returns `true` if no roots were recorded.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// On-disk shape of the cross-process key/value store.
#[derive(Archive, Deserialize, Serialize, Debug, Clone, Default)]
pub struct StateValues {
    /// Version of the state store format.
    pub version: u32,

    /// Stored values.
    pub values: HashMap<String, String>,
}
