//! Decides whether stored feed content is a full article or a stub.
//!
//! Feeds often carry only a teaser: a sentence or two, a trailing "Read
//! more", or a short blurb wrapped in layout markup. [`is_sufficient`] spots
//! those cases so the caller can go fetch the real article.

use crate::utils::strip_html;
use serde::Deserialize;

/// Thresholds for [`is_sufficient`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectorPolicy {
    /// Raw content shorter than this many characters is a stub.
    pub min_chars: usize,
    /// Minimum share of visible text over raw content length.
    pub min_text_ratio: f64,
    /// Trailing phrases that mark truncated content, matched case-insensitively.
    pub truncation_markers: Vec<String>,
}

impl Default for DetectorPolicy {
    fn default() -> Self {
        Self {
            min_chars: 500,
            min_text_ratio: 0.3,
            truncation_markers: ["…", "...", "[...]", "[…]", "read more", "continue reading"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Why content was judged insufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Sufficient,
    Empty,
    TooShort,
    Truncated,
    MarkupHeavy,
}

/// `true` when `content` can be summarized as-is.
pub fn is_sufficient(content: &str, policy: &DetectorPolicy) -> bool {
    classify(content, policy) == Verdict::Sufficient
}

/// Apply the sufficiency checks in order and report the first that fails.
pub fn classify(content: &str, policy: &DetectorPolicy) -> Verdict {
    if content.trim().is_empty() {
        return Verdict::Empty;
    }

    let raw_chars = content.chars().count();
    if raw_chars < policy.min_chars {
        return Verdict::TooShort;
    }

    let text = strip_html(content);
    if ends_with_marker(&text, &policy.truncation_markers) {
        return Verdict::Truncated;
    }

    let ratio = text.chars().count() as f64 / raw_chars as f64;
    if ratio < policy.min_text_ratio {
        return Verdict::MarkupHeavy;
    }

    Verdict::Sufficient
}

fn ends_with_marker(text: &str, markers: &[String]) -> bool {
    let tail = text
        .trim_end()
        .trim_end_matches(['»', '›', '→'])
        .trim_end()
        .to_lowercase();
    markers
        .iter()
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .any(|m| tail.ends_with(&m))
}
