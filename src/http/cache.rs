//! Conditional GET support
//!
//! Strong `ETag`s for full transfers, derived from size and modification
//! time so the file never has to be hashed.

use std::fs::Metadata;
use std::time::UNIX_EPOCH;

/// Generate a quoted `ETag` from file metadata, e.g. `"64-17f0c2a1b"`
pub fn etag_for(meta: &Metadata) -> String {
    let mtime_ns = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos());
    format!("\"{:x}-{mtime_ns:x}\"", meta.len())
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Handles lists (`"a", "b"`), the `*` wildcard, and weak validators,
/// which compare weakly for GET/HEAD.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client| {
        client.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
        })
    })
}
