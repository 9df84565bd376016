//! Tunable policy constants, loaded from an optional YAML settings file.
//!
//! Connection details and timeouts come from the CLI / environment (see
//! [`crate::cli`]). The thresholds that decide *how* articles are judged,
//! fetched and summarized live here so they can be tuned without a rebuild:
//!
//! ```yaml
//! detector:
//!   min_chars: 500
//!   min_text_ratio: 0.3
//!   truncation_markers: ["…", "...", "[...]", "read more"]
//! fetcher:
//!   max_redirects: 5
//!   concurrency: 1
//!   min_extracted_chars: 200
//! summarizer:
//!   max_content_chars: 1000
//! ```
//!
//! Every key is optional; missing ones take the defaults above.

use crate::enrich::detector::DetectorPolicy;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

/// Identifies the digest to the sites it fetches from.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "miniflux_digest/",
    env!("CARGO_PKG_VERSION"),
    " (full-text fetcher for feed summaries)"
);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub detector: DetectorPolicy,
    pub fetcher: FetcherSettings,
    pub summarizer: SummarizerSettings,
}

/// How full content is fetched when the detector asks for it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetcherSettings {
    /// Redirect hops followed before giving up.
    pub max_redirects: usize,
    /// Enrichment fetches in flight at once. 1 means sequential.
    pub concurrency: usize,
    /// Extracted text shorter than this counts as "nothing readable".
    pub min_extracted_chars: usize,
    pub user_agent: String,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            max_redirects: 5,
            concurrency: 1,
            min_extracted_chars: 200,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SummarizerSettings {
    /// Article text sent to the model is capped at this many characters.
    pub max_content_chars: usize,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            max_content_chars: 1000,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or return defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or when
    /// a value is out of range.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match path {
            None => Settings::default(),
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                let settings = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
                info!(path = %path.display(), "Loaded settings file");
                settings
            }
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a YAML document. An empty document yields defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.detector.min_text_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::Invalid {
                field: "detector.min_text_ratio",
                reason: format!("{ratio} is outside [0, 1]"),
            });
        }
        if self.fetcher.concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "fetcher.concurrency",
                reason: "must be at least 1".into(),
            });
        }
        if self.summarizer.max_content_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "summarizer.max_content_chars",
                reason: "must be at least 1".into(),
            });
        }
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "fetcher.user_agent",
                reason: "must not be blank".into(),
            });
        }
        Ok(())
    }
}
