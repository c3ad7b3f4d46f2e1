use crate::analyzer;
use crate::checkup::dtos::{AnalysisPayload, Exports, REALITY_CHECK_ITEMS, RUBRIC_VERSION};
use crate::exporter;
use crate::fetcher::{self, PAGE_TIMEOUT, PROBE_TIMEOUT};
use crate::scorer;
use chrono::{DateTime, Utc};
use tracing::instrument;
use url::Url;

/// One full analysis: fetch the page, probe robots.txt and sitemap.xml
/// concurrently, run the check battery, score, and render the three exports.
#[instrument(skip_all, fields(url = %url))]
pub async fn run_analysis(
    url: &Url,
    fetched_at: DateTime<Utc>,
    allow_private: bool,
) -> AnalysisPayload {
    let page = fetcher::fetch_following_redirects(url, PAGE_TIMEOUT, allow_private).await;

    // Probe against the origin the page actually landed on.
    let crawl_base = Url::parse(&page.final_url).ok().unwrap_or_else(|| url.clone());
    let probes = match (crawl_base.join("/robots.txt"), crawl_base.join("/sitemap.xml")) {
        (Ok(robots_url), Ok(sitemap_url)) => {
            let (robots, sitemap) = tokio::join!(
                fetcher::fetch_following_redirects(&robots_url, PROBE_TIMEOUT, allow_private),
                fetcher::fetch_following_redirects(&sitemap_url, PROBE_TIMEOUT, allow_private),
            );
            (Some(robots), Some(sitemap))
        }
        _ => (None, None),
    };
    let (robots, sitemap) = probes;

    let analysis = analyzer::analyze(url, &page, robots.as_ref(), sitemap.as_ref());
    let summary = scorer::score(&analysis, &page);

    let mut payload = AnalysisPayload {
        url: url.to_string(),
        fetched_at,
        rubric_version: RUBRIC_VERSION.to_string(),
        score: summary.score,
        grade: summary.grade,
        confidence: summary.confidence,
        categories: summary.categories,
        checks: analysis.checks.clone(),
        top_fixes: summary.top_fixes,
        limitations: summary.limitations,
        reality_check: REALITY_CHECK_ITEMS.iter().map(|item| item.to_string()).collect(),
        exports: Exports {
            markdown: String::new(),
            json: String::new(),
            html: String::new(),
        },
    };

    let snippets = exporter::recommended_snippets(
        url.as_str(),
        &analysis.title,
        &analysis.meta_description,
        &analysis.canonical,
    );
    // Build order matters: the JSON export embeds the payload as it stands,
    // with the markdown already present and json/html still empty.
    payload.exports.markdown =
        exporter::build_markdown_export(&payload, &analysis.checks, &snippets.json_ld_starter);
    payload.exports.json = exporter::build_json_export(&payload, &snippets);
    payload.exports.html = exporter::build_html_export(&snippets);

    payload
}
