//! # Miniflux Digest
//!
//! Reads recent entries from a Miniflux instance, makes sure each one has its
//! full text, summarizes every article through a local LLM using a
//! tool-calling contract, and writes a categorized HTML report.
//!
//! ## Usage
//!
//! ```sh
//! MINIFLUX_URL=https://reader.example.org MINIFLUX_API_KEY=... miniflux_digest -o ./reports
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Listing**: Pull entries from Miniflux for the configured time window
//! 2. **Enrichment**: Detect teaser content and fetch the full article page
//! 3. **Summarization**: One `summarize_article` tool call per article, sequentially
//! 4. **Output**: Group by category and render a standalone HTML page
//!
//! A failed fetch or summary never stops the run; a failed listing or a report
//! that cannot be written does.

use chrono::{Local, Utc};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod config;
mod enrich;
mod errors;
mod feed;
mod models;
mod organizer;
mod outputs;
mod pipeline;
mod summarizer;
#[cfg(test)]
mod test_support;
mod utils;

use api::OllamaBackend;
use cli::Cli;
use config::Settings;
use enrich::fetcher::HttpFetcher;
use enrich::EnrichOptions;
use feed::MinifluxClient;
use outputs::html::{log_console_digest, render_report, write_report, ReportMeta};
use pipeline::PipelineOptions;
use summarizer::SummarizerOptions;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "miniflux_digest starting up");
    debug!(
        miniflux_url = %args.miniflux_url,
        output = %args.output,
        lookback = ?args.lookback(),
        "Parsed CLI arguments"
    );

    let settings = Settings::load(args.config.as_deref()).map_err(|e| {
        error!(error = %e, "Invalid settings");
        e
    })?;

    // ---- Collaborators ----
    let feed = MinifluxClient::new(
        &args.miniflux_url,
        &args.miniflux_api_key,
        args.feed_limit,
        args.feed_timeout(),
    )?;
    let fetcher = HttpFetcher::new(&settings.fetcher)?;
    let backend = OllamaBackend::new(&args.ai_url, args.ai_timeout())?;

    let options = PipelineOptions {
        since: args.lookback().since(Utc::now()),
        feed_timeout: args.feed_timeout(),
        enrich: EnrichOptions {
            policy: settings.detector.clone(),
            timeout: args.fetch_timeout(),
            concurrency: settings.fetcher.concurrency,
            enabled: !args.no_fetch,
        },
        summarizer: SummarizerOptions {
            model: args.ai_model.clone(),
            max_content_chars: settings.summarizer.max_content_chars,
            timeout: args.ai_timeout(),
        },
        category_order: args.category_order,
    };
    info!(
        since = ?options.since,
        model = %options.summarizer.model,
        fetch_enabled = options.enrich.enabled,
        "Run configured"
    );

    // ---- Run ----
    let digest = pipeline::run(&feed, &fetcher, &backend, &options)
        .await
        .map_err(|e| {
            error!(error = %e, url = %args.miniflux_url, "Could not list feed entries");
            e
        })?;

    // ---- Report ----
    let meta = ReportMeta {
        generated_at: Utc::now(),
        miniflux_url: args.miniflux_url.clone(),
    };
    let written = match render_report(&digest.groups, &meta) {
        Ok(html) => write_report(&html, &args.output, Local::now()).await,
        Err(e) => Err(e),
    };
    let location = match written {
        Ok(location) => location,
        Err(e) => {
            error!(error = %e, "Error generating HTML report");
            log_console_digest(&digest.groups);
            return Err(e.into());
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        report = %location,
        articles = digest.stats.articles,
        categories = digest.groups.len(),
        fetched = digest.stats.fetched,
        fetch_failed = digest.stats.fetch_failed,
        summary_failed = digest.stats.summary_failed,
        elapsed_secs = elapsed.as_secs(),
        "Digest complete"
    );
    Ok(())
}
