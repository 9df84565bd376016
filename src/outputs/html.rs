//! Standalone HTML digest.
//!
//! The report is built with `writeln!` into a `String`, one section per
//! category:
//!
//! ```text
//! <section class="category-section">
//!   <h2 class="category-header" id="{slug}">{category}</h2>
//!   <article class="article-card">
//!     <h3 class="article-title"><a href="{url}">{title}</a></h3>
//!     <span class="article-category">{category}</span>
//!     <p class="article-meta">...</p>
//!     <p class="article-summary">{summary}</p>
//!   </article>
//! </section>
//! ```
//!
//! Every piece of feed or model text goes through `html_escape`.

use crate::errors::RenderError;
use crate::models::{CategoryGroup, ContentSource};
use crate::utils::{ensure_writable_dir, slugify_title};
use chrono::{DateTime, Local, Utc};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::collections::HashSet;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

/// Destination value that sends the report to standard output.
pub const STDOUT_DESTINATION: &str = "-";

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; max-width: 860px; margin: 0 auto; padding: 1.5rem; color: #222; background: #fafafa; }
header.report-header { border-bottom: 2px solid #ddd; margin-bottom: 1.5rem; }
nav.category-nav a { margin-right: 0.75rem; }
.category-header { border-bottom: 1px solid #ccc; padding-bottom: 0.25rem; }
.article-card { background: #fff; border: 1px solid #e3e3e3; border-radius: 6px; padding: 0.75rem 1rem; margin: 0.75rem 0; }
.article-title { margin: 0 0 0.25rem 0; font-size: 1.1rem; }
.article-category { font-size: 0.75rem; text-transform: uppercase; color: #666; }
.article-meta { font-size: 0.85rem; color: #777; margin: 0.25rem 0; }
.article-summary { line-height: 1.5; }
.summary-failed { color: #a33; font-style: italic; }
.empty-notice { color: #777; }
"#;

/// Report-level facts shown in the header.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub generated_at: DateTime<Utc>,
    pub miniflux_url: String,
}

/// Where a report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLocation {
    Stdout,
    File(PathBuf),
}

impl std::fmt::Display for ReportLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportLocation::Stdout => write!(f, "<stdout>"),
            ReportLocation::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Assign each category a unique, non-empty anchor id.
fn anchor_ids(groups: &[CategoryGroup]) -> Vec<String> {
    let mut seen = HashSet::new();
    groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let slug = slugify_title(g.category.trim());
            let mut id = if slug.is_empty() {
                format!("category-{}", i + 1)
            } else {
                slug
            };
            while !seen.insert(id.clone()) {
                id = format!("{id}-{}", i + 1);
            }
            id
        })
        .collect()
}

/// Render the digest as a complete HTML5 document.
///
/// # Arguments
///
/// * `groups` - Category groups in display order
/// * `meta` - Generation time and Miniflux link for the header
///
/// # Returns
///
/// The document text. Zero groups still renders a valid page with a notice.
#[instrument(level = "info", skip_all, fields(categories = groups.len()))]
pub fn render_report(groups: &[CategoryGroup], meta: &ReportMeta) -> Result<String, RenderError> {
    let total_articles: usize = groups.iter().map(|g| g.items.len()).sum();
    let failed: usize = groups
        .iter()
        .flat_map(|g| &g.items)
        .filter(|r| !r.is_ok())
        .count();
    let ids = anchor_ids(groups);
    let generated = meta.generated_at.format("%Y-%m-%d %H:%M UTC").to_string();

    let mut html = String::with_capacity(4096 + total_articles * 1024);
    writeln!(html, "<!DOCTYPE html>")?;
    writeln!(html, "<html lang=\"en\">")?;
    writeln!(html, "<head>")?;
    writeln!(html, "<meta charset=\"utf-8\">")?;
    writeln!(html, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">")?;
    writeln!(html, "<title>Feed Digest {}</title>", text(&generated))?;
    writeln!(html, "<style>{STYLE}</style>")?;
    writeln!(html, "</head>")?;
    writeln!(html, "<body>")?;

    writeln!(html, "<header class=\"report-header\">")?;
    writeln!(html, "<h1>Feed Digest</h1>")?;
    writeln!(
        html,
        "<p class=\"report-stats\">Generated {} &middot; {} articles in {} categories{}</p>",
        text(&generated),
        total_articles,
        groups.len(),
        if failed > 0 {
            format!(" &middot; {failed} without summary")
        } else {
            String::new()
        }
    )?;
    if !meta.miniflux_url.is_empty() {
        writeln!(
            html,
            "<p class=\"report-source\"><a href=\"{}\">Open Miniflux</a></p>",
            attr(&meta.miniflux_url)
        )?;
    }
    if !groups.is_empty() {
        write!(html, "<nav class=\"category-nav\">")?;
        for (group, id) in groups.iter().zip(&ids) {
            write!(
                html,
                "<a href=\"#{}\">{} ({})</a>",
                attr(id),
                text(&group.category),
                group.items.len()
            )?;
        }
        writeln!(html, "</nav>")?;
    }
    writeln!(html, "</header>")?;

    writeln!(html, "<main>")?;
    if groups.is_empty() {
        writeln!(html, "<p class=\"empty-notice\">No articles in this time window.</p>")?;
    }
    for (group, id) in groups.iter().zip(&ids) {
        writeln!(html, "<section class=\"category-section\">")?;
        writeln!(
            html,
            "<h2 class=\"category-header\" id=\"{}\">{}</h2>",
            attr(id),
            text(&group.category)
        )?;
        for item in &group.items {
            writeln!(html, "<article class=\"article-card\">")?;
            writeln!(
                html,
                "<h3 class=\"article-title\"><a href=\"{}\">{}</a></h3>",
                attr(&item.url),
                text(&item.title)
            )?;
            writeln!(html, "<span class=\"article-category\">{}</span>", text(&group.category))?;
            writeln!(
                html,
                "<p class=\"article-meta\">{} &middot; {} &middot; <time datetime=\"{}\">{}</time>{}</p>",
                text(&item.source),
                text(&item.author),
                attr(&item.published_at.to_rfc3339()),
                item.published_at.format("%Y-%m-%d %H:%M"),
                if item.content_source == ContentSource::Fetched {
                    " &middot; full text"
                } else {
                    ""
                }
            )?;
            let class = if item.is_ok() {
                "article-summary"
            } else {
                "article-summary summary-failed"
            };
            writeln!(html, "<p class=\"{class}\">{}</p>", text(&item.summary))?;
            writeln!(html, "</article>")?;
        }
        writeln!(html, "</section>")?;
    }
    writeln!(html, "</main>")?;
    writeln!(html, "</body>")?;
    writeln!(html, "</html>")?;

    info!(total_articles, failed, bytes = html.len(), "Rendered report");
    Ok(html)
}

/// File name for a report generated at `now`.
pub fn report_filename(now: DateTime<Local>) -> String {
    format!("summary_{}.html", now.format("%Y%m%d_%H%M%S"))
}

/// Write the report to `destination`.
///
/// `destination` is either [`STDOUT_DESTINATION`] or a directory, which is
/// created if missing and probed for writability before the file
/// `summary_YYYYMMDD_HHMMSS.html` is written into it.
#[instrument(level = "info", skip_all, fields(%destination))]
pub async fn write_report(
    html: &str,
    destination: &str,
    now: DateTime<Local>,
) -> Result<ReportLocation, RenderError> {
    if destination == STDOUT_DESTINATION {
        let mut stdout = tokio::io::stdout();
        let io_err = |source| RenderError::Io {
            path: STDOUT_DESTINATION.to_string(),
            source,
        };
        stdout.write_all(html.as_bytes()).await.map_err(io_err)?;
        stdout.flush().await.map_err(io_err)?;
        return Ok(ReportLocation::Stdout);
    }

    let dir = Path::new(destination);
    ensure_writable_dir(dir).await.map_err(|source| RenderError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let path = dir.join(report_filename(now));
    fs::write(&path, html).await.map_err(|source| RenderError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(path = %path.display(), "Wrote report");
    Ok(ReportLocation::File(path))
}

/// Dump the digest to the log when no report could be produced.
pub fn log_console_digest(groups: &[CategoryGroup]) {
    warn!("Falling back to console output");
    for group in groups {
        info!(category = %group.category, articles = group.items.len(), "Category");
        for item in &group.items {
            info!(
                title = %item.title,
                source = %item.source,
                published_at = %item.published_at.to_rfc3339(),
                url = %item.url,
                summary = %item.summary,
                "Article"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SummaryResult, SummaryStatus, UNCATEGORIZED};
    use chrono::TimeZone;
    use scraper::{Html, Selector};

    fn item(id: i64, title: &str, category: &str, summary: &str, status: SummaryStatus) -> SummaryResult {
        SummaryResult {
            article_id: id,
            title: title.to_string(),
            url: format!("https://example.org/{id}?a=1&b=2"),
            category: category.to_string(),
            summary: summary.to_string(),
            status,
            source: "Example Feed".into(),
            author: "Reporter".into(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            content_source: ContentSource::Original,
        }
    }

    fn meta() -> ReportMeta {
        ReportMeta {
            generated_at: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
            miniflux_url: "https://reader.example.org".into(),
        }
    }

    fn groups() -> Vec<CategoryGroup> {
        vec![
            CategoryGroup {
                category: "Tech & Science".into(),
                items: vec![
                    item(1, "Chips <get> faster", "Tech & Science", "Smaller nodes \"win\".", SummaryStatus::Ok),
                    item(2, "Rust 2024", "Tech & Science", "Summary unavailable (timed out)", SummaryStatus::Failed),
                ],
            },
            CategoryGroup {
                category: UNCATEGORIZED.into(),
                items: vec![item(3, "Local news", "", "Roads reopen.", SummaryStatus::Ok)],
            },
        ]
    }

    fn triples(doc: &Html) -> Vec<(String, String, String)> {
        let card = Selector::parse("article.article-card").unwrap();
        let title = Selector::parse(".article-title a").unwrap();
        let category = Selector::parse("span.article-category").unwrap();
        let summary = Selector::parse("p.article-summary").unwrap();
        let text_of = |el: scraper::ElementRef, sel: &Selector| {
            el.select(sel).next().map(|e| e.text().collect::<String>()).unwrap_or_default()
        };
        doc.select(&card)
            .map(|c| (text_of(c, &title), text_of(c, &category), text_of(c, &summary)))
            .collect()
    }

    #[test]
    fn test_rendered_report_round_trips() {
        let groups = groups();
        let html = render_report(&groups, &meta()).unwrap();
        let doc = Html::parse_document(&html);

        let expected: Vec<(String, String, String)> = groups
            .iter()
            .flat_map(|g| {
                g.items
                    .iter()
                    .map(move |r| (r.title.clone(), g.category.clone(), r.summary.clone()))
            })
            .collect();
        assert_eq!(triples(&doc), expected);

        let headers: Vec<String> = doc
            .select(&Selector::parse("section.category-section h2.category-header").unwrap())
            .map(|h| h.text().collect())
            .collect();
        assert_eq!(headers, vec!["Tech & Science".to_string(), UNCATEGORIZED.to_string()]);
    }

    #[test]
    fn test_links_and_failed_marker() {
        let html = render_report(&groups(), &meta()).unwrap();
        let doc = Html::parse_document(&html);
        let hrefs: Vec<&str> = doc
            .select(&Selector::parse(".article-title a").unwrap())
            .filter_map(|a| a.value().attr("href"))
            .collect();
        assert_eq!(hrefs[0], "https://example.org/1?a=1&b=2");
        let failed = doc.select(&Selector::parse("p.summary-failed").unwrap()).count();
        assert_eq!(failed, 1);
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render_report(&groups(), &meta()).unwrap();
        assert!(html.contains("Chips &lt;get&gt; faster"));
        assert!(!html.contains("<get>"));
        assert!(html.contains("Tech &amp; Science"));
    }

    #[test]
    fn test_anchor_ids_are_unique_and_non_empty() {
        let groups = vec![
            CategoryGroup { category: "News".into(), items: vec![] },
            CategoryGroup { category: "news".into(), items: vec![] },
            CategoryGroup { category: "!!!".into(), items: vec![] },
        ];
        assert_eq!(anchor_ids(&groups), vec!["news", "news-2", "category-3"]);
    }

    #[test]
    fn test_zero_groups_renders_notice() {
        let html = render_report(&[], &meta()).unwrap();
        let doc = Html::parse_document(&html);
        assert_eq!(doc.select(&Selector::parse("section.category-section").unwrap()).count(), 0);
        assert!(html.contains("No articles"));
        assert!(html.contains("0 articles in 0 categories"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_report_filename_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(report_filename(now), "summary_20240305_070809.html");
    }

    #[tokio::test]
    async fn test_write_report_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reports");
        let now = Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        let location = write_report("<html></html>", out.to_str().unwrap(), now)
            .await
            .unwrap();
        let expected = out.join("summary_20240305_070809.html");
        assert_eq!(location, ReportLocation::File(expected.clone()));
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "<html></html>");
    }

    #[tokio::test]
    async fn test_write_report_to_unusable_directory_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = write_report("<html></html>", file.path().to_str().unwrap(), Local::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Io { .. }));
    }
}
