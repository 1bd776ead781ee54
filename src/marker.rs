//! Reading the "last used" markers the build tool leaves in version caches.
//!
//! Gradle marks a version cache as used by touching an empty
//! `gc.properties`, so the marker's own mtime is the primary signal. A marker
//! may also carry epoch milliseconds, either as a bare integer or as a
//! `lastUsed=<integer>` line; the later of the two wins. A marker that cannot
//! be used never fails the caller.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::discovery::CacheRoot;
use crate::error::HoldError;
use crate::logging::Logger;
use crate::state::CacheKind;
use crate::timestamp::{NEVER_USED, millis_to_nanos, mtime_nanos, newest_mtime_nanos};

/// Property key holding the timestamp in a properties-style marker.
const LAST_USED_KEY: &str = "lastUsed";

/// Reads the marker at `path`.
///
/// Returns the later of the marker's mtime and the timestamp in its content.
/// A missing marker is [`NEVER_USED`]. Empty or comment-only content is
/// normal and falls back to the mtime silently; unreadable or unparsable
/// content falls back to the mtime with a warning.
pub fn read_marker(path: &Path, log: Logger) -> u128 {
    let Some(modified) = mtime_nanos(path) else {
        return NEVER_USED;
    };

    match try_read_marker(path) {
        Ok(Some(nanos)) => nanos.max(modified),
        Ok(None) => modified,
        Err(err) => {
            log.warn(err);
            modified
        }
    }
}

fn try_read_marker(path: &Path) -> Result<Option<u128>, HoldError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(HoldError::MarkerUnreadable {
                path: path.to_path_buf(),
                reason: err.to_string(),
            });
        }
    };

    if !content.lines().any(|line| !is_blank_or_comment(line)) {
        return Ok(None);
    }

    parse_marker(&content)
        .map(|millis| Some(millis_to_nanos(millis)))
        .ok_or_else(|| HoldError::MarkerUnreadable {
            path: path.to_path_buf(),
            reason: "no timestamp found".to_string(),
        })
}

fn is_blank_or_comment(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with(['#', '!'])
}

/// Extracts the millisecond timestamp from marker content.
fn parse_marker(content: &str) -> Option<u64> {
    for line in content.lines().filter(|line| !is_blank_or_comment(line)) {
        let line = line.trim();

        if let Ok(millis) = line.parse::<u64>() {
            return Some(millis);
        }

        if let Some((key, value)) = line.split_once(['=', ':'])
            && key.trim() == LAST_USED_KEY
        {
            return value.trim().parse().ok();
        }
    }
    None
}

/// Current usage signal of `root`, in nanoseconds.
///
/// - module versions: newest mtime anywhere in the version directory
/// - build blobs: the blob's own mtime
/// - version caches: the later of the marker (see [`read_marker`]) and the
///   directory mtime
/// - wrapper distributions: the directory mtime
pub fn usage_signal(root: &CacheRoot, log: Logger) -> u128 {
    match root.kind() {
        CacheKind::ModuleCache => newest_mtime_nanos(root.path()),
        CacheKind::BuildCache | CacheKind::WrapperDistCache => {
            mtime_nanos(root.path()).unwrap_or(NEVER_USED)
        }
        CacheKind::VersionCache => {
            let marker = root
                .marker()
                .map_or(NEVER_USED, |marker| read_marker(marker, log));
            let dir = mtime_nanos(root.path()).unwrap_or(NEVER_USED);
            marker.max(dir)
        }
    }
}
