//! Flat-file output directory: collision-resistant names and safe path resolution.
//!
//! Generated PDFs are never overwritten or cleaned up. Each name embeds a
//! timestamp and a random id, so concurrent requests never share a path.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static UNSAFE_FILENAME_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\-.]").expect("filename regex must compile"));

/// Replaces every character other than word characters, `-`, `_` and `.` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_CHARS_RE.replace_all(name, "_").into_owned()
}

/// `resume_<YYYYmmdd_HHMMSS>_<8 hex chars>_<sanitized original name>`
pub fn output_filename<Tz: TimeZone>(original: &str, now: DateTime<Tz>, id: Uuid) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let short_id: String = id.simple().to_string().chars().take(8).collect();
    format!(
        "resume_{}_{}_{}",
        now.format("%Y%m%d_%H%M%S"),
        short_id,
        sanitize_filename(original)
    )
}

/// Resolves an already-sanitized name inside `dir`. Rejects names that could
/// refer to the directory itself or its parent.
pub fn resolve(dir: &Path, sanitized: &str) -> Option<PathBuf> {
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return None;
    }
    Some(dir.join(sanitized))
}
