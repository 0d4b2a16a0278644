//! Last-modified resolution for document sources.
//!
//! Only `file:` origins have a knowable modification time. Everything else,
//! including identifiers that do not parse as URLs, resolves to "unknown",
//! which callers treat as "omit the validation header".

use std::time::{SystemTime, UNIX_EPOCH};

use url::Url;

/// Sentinel for an unknown timestamp in epoch-millisecond form.
pub const UNKNOWN: i64 = -1;

/// Resolve the modification time of the resource named by `origin`.
///
/// Returns `None` when the origin is blank, unparseable, not a `file:` URL,
/// or names a file that does not exist.
#[must_use]
pub fn resolve(origin: &str) -> Option<SystemTime> {
    let origin = origin.trim();
    if origin.is_empty() {
        return None;
    }
    let url = Url::parse(origin).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    let path = url.to_file_path().ok()?;
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Convert a resolved timestamp to epoch milliseconds, [`UNKNOWN`] for `None`.
#[must_use]
pub fn as_epoch_millis(time: Option<SystemTime>) -> i64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .and_then(|d| i64::try_from(d.as_millis()).ok())
        .unwrap_or(UNKNOWN)
}
