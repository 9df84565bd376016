//! Text helpers and file system checks shared across the pipeline.
//!
//! This module provides:
//! - HTML stripping and whitespace normalization for feed content
//! - Character-safe truncation for prompts and log previews
//! - Slugification for report anchors
//! - Output directory validation

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.!?,:;])").expect("static regex"));

/// Strip HTML tags from feed content and normalize whitespace.
///
/// Tags are replaced by a single space so adjacent words never fuse. Entities
/// are decoded once the tags are gone, so escaped markup survives as text.
/// Runs of whitespace collapse to one space and stray spaces left in front of
/// punctuation are removed.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_html("<p>Hello <b>world</b>!</p>"), "Hello world!");
/// ```
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let text = TAG_RE.replace_all(html, " ");
    let text = html_escape::decode_html_entities(&text);
    let text = collapse_whitespace(&text);
    SPACE_BEFORE_PUNCT_RE.replace_all(&text, "$1").into_owned()
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WS_RE.replace_all(s, " ").trim().to_string()
}

/// Cap `content` at `max_chars` characters.
///
/// When the content is cut, the last kept character is replaced by `…` so the
/// result is exactly `max_chars` characters long.
///
/// # Returns
///
/// The (possibly shortened) content and whether it was cut.
pub fn truncate_content(content: &str, max_chars: usize) -> (String, bool) {
    if content.chars().count() <= max_chars {
        return (content.to_string(), false);
    }
    let mut out: String = content.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    (out, true)
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the nearest character boundary at or below `max`
/// bytes and get a `"…(+N bytes)"` suffix.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert a category or title to a URL-friendly slug.
///
/// Lowercases the text, drops anything that is not alphanumeric, a space or a
/// hyphen, and turns spaces into hyphens.
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .replace(' ', "-")
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
///
/// # Errors
///
/// Returns the underlying I/O error if the directory cannot be created or
/// written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    // Blocking probe write
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
