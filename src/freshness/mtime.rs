//! Mtime fingerprints.
//!
//! A fingerprint is a cheap proxy for "file unchanged": the modification
//! time in milliseconds since the epoch. Content is only rehashed when the
//! fingerprint moves.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Fingerprint for a file: mtime in epoch milliseconds.
pub fn fingerprint(path: &Path) -> Option<u128> {
    get_mtime(path).map(millis)
}

/// Current time in epoch milliseconds.
pub fn now_millis() -> u128 {
    millis(SystemTime::now())
}

fn millis(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
