//! Command-line interface definitions.
//!
//! Every option can also come from the environment (a `.env` file in the
//! working directory is loaded first), so a cron job typically sets
//! `MINIFLUX_URL` and `MINIFLUX_API_KEY` and passes no flags at all.

use crate::feed::Lookback;
use crate::organizer::CategoryOrder;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Summarize recent Miniflux entries into a categorized HTML digest.
///
/// # Examples
///
/// ```sh
/// # Last 6 hours, report in the current directory
/// miniflux_digest --miniflux-url https://reader.example.org --miniflux-api-key KEY
///
/// # Everything in the feed, printed to stdout, no page fetching
/// miniflux_digest --all --no-fetch -o -
///
/// # Tuned thresholds
/// miniflux_digest --config digest.yaml --hours 24
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Base URL of the Miniflux instance
    #[arg(long, env = "MINIFLUX_URL")]
    pub miniflux_url: String,

    /// Miniflux API token
    #[arg(long, env = "MINIFLUX_API_KEY", hide_env_values = true)]
    pub miniflux_api_key: String,

    /// Only summarize entries published in the last N hours
    #[arg(long = "hours", env = "ARTICLE_HOURS_BACK", default_value_t = 6)]
    pub hours_back: u32,

    /// Summarize every entry regardless of age
    #[arg(long)]
    pub all: bool,

    /// Maximum number of entries to request from Miniflux
    #[arg(long, env = "FEED_LIMIT")]
    pub feed_limit: Option<u32>,

    /// Base URL of the Ollama server
    #[arg(long, env = "AI_URL", default_value = "http://localhost:11434")]
    pub ai_url: String,

    /// Model used for summaries; must support tool calling
    #[arg(long, env = "AI_MODEL", default_value = "llama3.1:8b")]
    pub ai_model: String,

    /// Directory for the HTML report, or `-` for stdout
    #[arg(short, long, env = "OUTPUT", default_value = ".")]
    pub output: String,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Seconds allowed for listing entries
    #[arg(long, env = "FEED_TIMEOUT_SECS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub feed_timeout_secs: u64,

    /// Seconds allowed for fetching one article page
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub fetch_timeout_secs: u64,

    /// Seconds allowed for one summary request
    #[arg(long, env = "AI_TIMEOUT_SECS", default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub ai_timeout_secs: u64,

    /// Never fetch article pages; summarize stored content only
    #[arg(long)]
    pub no_fetch: bool,

    /// Order of category sections in the report
    #[arg(long, env = "CATEGORY_ORDER", value_enum, default_value_t = CategoryOrder::FirstSeen)]
    pub category_order: CategoryOrder,

    /// Optional path to a YAML settings file with detector/fetcher/summarizer thresholds
    #[arg(short, long, env = "DIGEST_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn lookback(&self) -> Lookback {
        if self.all {
            Lookback::All
        } else {
            Lookback::Hours(self.hours_back)
        }
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }
}
