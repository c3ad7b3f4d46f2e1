//! The three export renderings of one analysis: a Markdown fix pack, a JSON
//! document with paste-ready snippets, and raw HTML head tags. All three are
//! deterministic functions of the payload plus the recommended-snippet set.

use crate::analyzer::html::escape_html;
use crate::analyzer::model::CheckResult;
use crate::checkup::dtos::AnalysisPayload;
use crate::scorer::prioritized_fix_checks;
use serde::Serialize;
use serde_json::json;

const PLACEHOLDER_TITLE: &str = "Business Name | Service + Location";
const PLACEHOLDER_DESCRIPTION: &str =
    "Concise summary of what you offer, where you operate, and who you serve.";

/// Starter JSON-LD object recommended to the site owner. Field order is the
/// serialization order.
#[derive(Debug, Clone, Serialize)]
pub struct JsonLdStarter {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub entity_type: String,
    pub name: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct RecommendedSnippets {
    /// Paste-ready head tags (title, description, robots, canonical).
    pub head_tags: String,
    /// Pretty-printed JSON-LD starter source.
    pub json_ld_starter: String,
    pub starter: JsonLdStarter,
}

/// Best-effort title/description/canonical values with generic placeholders
/// where the page had nothing usable. Everything is HTML-escaped since the
/// output lands in markup.
pub fn recommended_snippets(
    url: &str,
    title: &str,
    description: &str,
    canonical: &str,
) -> RecommendedSnippets {
    let safe_title = escape_html(if title.is_empty() { PLACEHOLDER_TITLE } else { title });
    let safe_description = escape_html(if description.is_empty() {
        PLACEHOLDER_DESCRIPTION
    } else {
        description
    });
    let safe_canonical = escape_html(if canonical.is_empty() { url } else { canonical });

    let starter = JsonLdStarter {
        context: "https://schema.org".to_string(),
        entity_type: "Organization".to_string(),
        name: safe_title.clone(),
        url: safe_canonical.clone(),
        description: safe_description.clone(),
    };
    let json_ld_starter = serde_json::to_string_pretty(&starter).unwrap_or_default();

    let head_tags = [
        format!("<title>{}</title>", safe_title),
        format!(r#"<meta name="description" content="{}" />"#, safe_description),
        r#"<meta name="robots" content="index,follow" />"#.to_string(),
        format!(r#"<link rel="canonical" href="{}" />"#, safe_canonical),
    ]
    .join("\n");

    RecommendedSnippets {
        head_tags,
        json_ld_starter,
        starter,
    }
}

pub fn build_markdown_export(
    payload: &AnalysisPayload,
    checks: &[CheckResult],
    json_ld_starter: &str,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("# AI Visibility Checkup - Fix Pack".to_string());
    lines.push(String::new());
    lines.push(format!("- URL: {}", payload.url));
    lines.push(format!("- Score: {}/100 ({})", payload.score, payload.grade));
    lines.push(format!("- Confidence: {}", payload.confidence));
    lines.push(format!("- Rubric version: {}", payload.rubric_version));
    lines.push(String::new());
    lines.push("## Prioritized checklist".to_string());

    let prioritized: Vec<&CheckResult> =
        prioritized_fix_checks(checks).into_iter().take(7).collect();
    if prioritized.is_empty() {
        lines.push("- [ ] No high-priority fixes from this run.".to_string());
    } else {
        for item in prioritized {
            lines.push(format!("- [ ] {}: {}", item.name, item.fix));
            lines.push(format!("  - Found: {}", item.evidence));
            lines.push(
                "  - Why it matters: Improves crawl understanding and retrieval quality."
                    .to_string(),
            );
            lines.push(format!("  - How to fix: {}", item.fix));
        }
    }

    lines.push(String::new());
    lines.push("## Reality Check (Not scored)".to_string());
    for item in &payload.reality_check {
        lines.push(format!("- {}", item));
    }

    lines.push(String::new());
    lines.push("## JSON-LD starter".to_string());
    lines.push("```json".to_string());
    lines.push(json_ld_starter.to_string());
    lines.push("```".to_string());
    lines.push(String::new());
    lines.push("## Developer notes".to_string());
    lines.push("- Paste meta tags into the page <head> template.".to_string());
    lines.push(
        "- Keep title, H1, canonical, and schema values aligned to the same page intent."
            .to_string(),
    );
    lines.push("- Replace placeholders before publishing.".to_string());

    lines.join("\n")
}

pub fn build_json_export(payload: &AnalysisPayload, snippets: &RecommendedSnippets) -> String {
    let mut value = serde_json::to_value(payload).unwrap_or_default();
    if let serde_json::Value::Object(map) = &mut value {
        map.insert(
            "snippets".to_string(),
            json!({
                "headTags": snippets.head_tags,
                "jsonLdStarter": snippets.starter,
                "placementNotes": [
                    "Paste headTags into <head>.",
                    "Paste JSON-LD script in <head> or before </body>.",
                ],
            }),
        );
    }
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

pub fn build_html_export(snippets: &RecommendedSnippets) -> String {
    [
        "<!-- Paste into <head> -->".to_string(),
        snippets.head_tags.clone(),
        String::new(),
        "<!-- Paste into <head> or before </body> -->".to_string(),
        r#"<script type="application/ld+json">"#.to_string(),
        snippets.json_ld_starter.clone(),
        "</script>".to_string(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::checks;
    use crate::analyzer::model::{CheckStatus, Confidence, Grade};
    use crate::checkup::dtos::{Exports, REALITY_CHECK_ITEMS, RUBRIC_VERSION};
    use crate::scorer::summarize_categories;
    use chrono::Utc;

    fn sample_checks() -> Vec<crate::analyzer::model::CheckResult> {
        vec![
            checks::META_TITLE.result(CheckStatus::Fail, 0, "No title tag found.", None),
            checks::CONTENT_TRUST.result(CheckStatus::Warn, 1, "weak", None),
        ]
    }

    fn sample_payload() -> AnalysisPayload {
        let checks = sample_checks();
        AnalysisPayload {
            url: "https://example.com/".to_string(),
            fetched_at: Utc::now(),
            rubric_version: RUBRIC_VERSION.to_string(),
            score: 48,
            grade: Grade::Fair,
            confidence: Confidence::Medium,
            categories: summarize_categories(&checks),
            checks: checks.clone(),
            top_fixes: vec![checks[0].fix.clone()],
            limitations: vec![],
            reality_check: REALITY_CHECK_ITEMS.iter().map(|s| s.to_string()).collect(),
            exports: Exports {
                markdown: String::new(),
                json: String::new(),
                html: String::new(),
            },
        }
    }

    #[test]
    fn snippets_fall_back_to_placeholders() {
        let snippets = recommended_snippets("https://example.com/", "", "", "");
        assert!(snippets.head_tags.contains(PLACEHOLDER_TITLE));
        assert!(snippets.head_tags.contains(PLACEHOLDER_DESCRIPTION));
        assert!(snippets.head_tags.contains(r#"href="https://example.com/""#));
        assert!(snippets.json_ld_starter.contains("\"@type\": \"Organization\""));
    }

    #[test]
    fn snippets_escape_markup_in_page_values() {
        let snippets = recommended_snippets(
            "https://example.com/",
            "Tools <& Toys>",
            "We sell \"things\"",
            "",
        );
        assert!(snippets.head_tags.contains("Tools &lt;&amp; Toys&gt;"));
        assert!(snippets.head_tags.contains("&quot;things&quot;"));
    }

    #[test]
    fn markdown_lists_prioritized_fixes_with_evidence() {
        let payload = sample_payload();
        let snippets = recommended_snippets(&payload.url, "", "", "");
        let markdown = build_markdown_export(&payload, &payload.checks, &snippets.json_ld_starter);
        assert!(markdown.starts_with("# AI Visibility Checkup - Fix Pack"));
        assert!(markdown.contains("- Score: 48/100 (Fair)"));
        assert!(markdown.contains("- [ ] Title tag quality:"));
        assert!(markdown.contains("  - Found: No title tag found."));
        assert!(markdown.contains("## Reality Check (Not scored)"));
        assert!(markdown.contains("```json"));
    }

    #[test]
    fn markdown_without_fixes_says_so() {
        let mut payload = sample_payload();
        payload.checks =
            vec![checks::META_TITLE.result(CheckStatus::Pass, 7, "Title found (30 chars).", None)];
        let snippets = recommended_snippets(&payload.url, "", "", "");
        let markdown = build_markdown_export(&payload, &payload.checks, &snippets.json_ld_starter);
        assert!(markdown.contains("No high-priority fixes from this run."));
    }

    #[test]
    fn json_export_embeds_payload_and_snippets() {
        let payload = sample_payload();
        let snippets = recommended_snippets(&payload.url, "Example Site Title Here", "", "");
        let raw = build_json_export(&payload, &snippets);
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["url"], "https://example.com/");
        assert_eq!(parsed["rubricVersion"], "1.0");
        assert!(parsed["snippets"]["headTags"].as_str().unwrap().contains("<title>"));
        assert_eq!(parsed["snippets"]["jsonLdStarter"]["@type"], "Organization");
        assert_eq!(parsed["snippets"]["placementNotes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn html_export_is_paste_ready() {
        let snippets = recommended_snippets("https://example.com/", "", "", "");
        let html = build_html_export(&snippets);
        assert!(html.starts_with("<!-- Paste into <head> -->"));
        assert!(html.contains(r#"<script type="application/ld+json">"#));
        assert!(html.trim_end().ends_with("</script>"));
    }
}
