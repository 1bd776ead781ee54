//! Conversions between filesystem times and the `u128` nanosecond
//! timestamps stored in snapshots.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};


const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MILLI: u128 = 1_000_000;

/// Timestamp value meaning "never used".
pub const NEVER_USED: u128 = 0;

/// Convert SystemTime to nanoseconds since UNIX_EPOCH.
///
/// Times before the epoch clamp to [`NEVER_USED`].
pub fn system_time_to_nanos(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos()
}

/// Convert epoch milliseconds (the unit markers are written in) to nanos.
pub fn millis_to_nanos(millis: u64) -> u128 {
    millis as u128 * NANOS_PER_MILLI
}

/// Current wall clock time in nanoseconds.
pub fn now_nanos() -> u128 {
    system_time_to_nanos(SystemTime::now())
}

/// Modification time of `path` in nanoseconds, without following symlinks.
///
/// Returns `None` when the path cannot be stat'ed.
pub fn mtime_nanos(path: &Path) -> Option<u128> {
    let metadata = fs::symlink_metadata(path).ok()?;
    metadata.modified().ok().map(system_time_to_nanos)
}

/// Newest modification time anywhere in the subtree rooted at `path`,
/// including `path` itself.
///
/// Unreadable children are ignored; a missing `path` yields [`NEVER_USED`].
pub fn newest_mtime_nanos(path: &Path) -> u128 {
    walkdir::WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter_map(|metadata| metadata.modified().ok())
        .map(system_time_to_nanos)
        .max()
        .unwrap_or(NEVER_USED)
}

/// Render a nanosecond timestamp as "N s ago" relative to now.
pub fn describe_age(nanos: u128) -> String {
    let now = now_nanos();
    if nanos == NEVER_USED {
        return "never".to_string();
    }
    let secs = now.saturating_sub(nanos) / NANOS_PER_SECOND;
    format!("{secs}s ago")
}
