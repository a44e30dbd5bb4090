//! Stream-name sanitization for frame filenames and display identifiers.
//!
//! Both the frame snapshot path and any identifier derived from a stream name
//! go through [`sanitize_stream_name`], so the two can never disagree.

use std::path::{Path, PathBuf};

/// Image extension of frame snapshots.
pub const FRAME_EXTENSION: &str = "jpg";

/// Whether `c` survives sanitization.
#[inline]
fn is_kept(c: char) -> bool {
    c.is_alphanumeric() || c == ' ' || c == '.'
}

/// Keep only alphanumerics, spaces and dots, then trim trailing whitespace.
///
/// Leading characters are left alone. Two names that differ only in dropped
/// characters map to the same string.
///
/// # Examples
///
/// ```
/// use streamwatch::utils::filename::sanitize_stream_name;
///
/// assert_eq!(sanitize_stream_name("News/24 (HD)"), "News24 HD");
/// assert_eq!(sanitize_stream_name("Sport 1 | "), "Sport 1");
/// ```
pub fn sanitize_stream_name(name: &str) -> String {
    let kept: String = name.chars().filter(|c| is_kept(*c)).collect();
    kept.trim_end().to_string()
}

/// Identifier for a stream as shown to consumers of the stored data.
pub fn stream_identifier(name: &str) -> String {
    sanitize_stream_name(name)
}

/// File name of the frame snapshot for `(source_id, stream_name)`.
pub fn frame_filename(source_id: i64, stream_name: &str) -> String {
    format!(
        "s{}_{}.{}",
        source_id,
        sanitize_stream_name(stream_name),
        FRAME_EXTENSION
    )
}

/// Full path of the frame snapshot inside `frames_dir`.
pub fn frame_path(frames_dir: &Path, source_id: i64, stream_name: &str) -> PathBuf {
    frames_dir.join(frame_filename(source_id, stream_name))
}
