pub mod checks;
pub mod html;
pub mod jsonld;
pub mod model;

use crate::fetcher::FetchOutcome;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use html::{
    count_h1_tags, count_h2_h3_tags, count_script_tags, extract_body_text, extract_title,
    find_canonical, find_meta_tag, has_about_contact_links, has_noindex_directive,
    looks_like_sitemap,
};
use jsonld::inspect_json_ld;
use model::{CheckResult, CheckStatus, JsShell};

static TRUST_WORD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(about|contact)\b").unwrap());

/// Everything the scorer needs from one pass over the fetched artifacts.
/// Checks are appended in a fixed order; all evaluation is pure.
#[derive(Debug)]
pub struct Analysis {
    pub checks: Vec<CheckResult>,
    pub js_shell: JsShell,
    pub title: String,
    pub meta_description: String,
    pub canonical: String,
    pub description_length: usize,
    pub body_text_length: usize,
    pub json_ld_parse_errors: usize,
}

pub fn analyze(
    requested_url: &Url,
    page: &FetchOutcome,
    robots: Option<&FetchOutcome>,
    sitemap: Option<&FetchOutcome>,
) -> Analysis {
    let html = page.html.as_str();
    let html_length = html.chars().count();
    let body_text = extract_body_text(html);
    let body_text_length = body_text.chars().count();
    let script_count = count_script_tags(html);
    let js_shell = detect_js_shell(body_text_length, script_count);

    let title = extract_title(html);
    let meta_description = find_meta_tag(html, "description");
    let robots_meta = find_meta_tag(html, "robots");
    let canonical = find_canonical(html);

    let final_url = Url::parse(&page.final_url).ok();
    let canonical_base = final_url.as_ref().unwrap_or(requested_url);
    let canonical_url = resolve_canonical(&canonical, canonical_base);

    let mut results: Vec<CheckResult> = Vec::with_capacity(16);

    // Access
    let (fetch_status, fetch_points) = if page.ok && html_length > 200 {
        (CheckStatus::Pass, checks::ACCESS_FETCH.max)
    } else if page.ok {
        (CheckStatus::Warn, 5)
    } else {
        (CheckStatus::Fail, 0)
    };
    let fetch_evidence = if page.ok {
        format!("Fetched HTML successfully ({} chars).", html_length)
    } else {
        page.error
            .clone()
            .unwrap_or_else(|| format!("Fetch failed ({}).", page.status))
    };
    results.push(checks::ACCESS_FETCH.result(fetch_status, fetch_points, fetch_evidence, None));

    let status_ok = (200..300).contains(&page.status);
    results.push(checks::ACCESS_STATUS.result(
        if status_ok { CheckStatus::Pass } else { CheckStatus::Fail },
        if status_ok { checks::ACCESS_STATUS.max } else { 0 },
        format!("Final status code: {}.", page.status),
        None,
    ));

    results.push(redirect_check(page, canonical_url.as_ref(), final_url.as_ref()));
    results.push(robots_txt_check(robots));
    results.push(sitemap_check(sitemap));

    // Metadata
    let title_length = title.chars().count();
    let (title_status, title_points) = if title_length >= 18 {
        (CheckStatus::Pass, checks::META_TITLE.max)
    } else if title_length > 0 {
        (CheckStatus::Warn, 3)
    } else {
        (CheckStatus::Fail, 0)
    };
    results.push(checks::META_TITLE.result(
        title_status,
        title_points,
        if title.is_empty() {
            "No title tag found.".to_string()
        } else {
            format!("Title found ({} chars).", title_length)
        },
        (!title.is_empty()).then(|| format!("<title>{}</title>", title)),
    ));

    let description_length = meta_description.trim().chars().count();
    results.push(description_check(&meta_description, description_length));

    let noindex = has_noindex_directive(&robots_meta);
    results.push(checks::META_ROBOTS.result(
        if noindex { CheckStatus::Fail } else { CheckStatus::Pass },
        if noindex { 0 } else { checks::META_ROBOTS.max },
        if robots_meta.is_empty() {
            "No robots meta set (default crawl behavior).".to_string()
        } else {
            format!("Robots directive: {}.", robots_meta)
        },
        (!robots_meta.is_empty())
            .then(|| format!(r#"<meta name="robots" content="{}" />"#, robots_meta)),
    ));

    results.push(canonical_check(
        &canonical,
        canonical_url.as_ref(),
        final_url.as_ref(),
        &page.final_url,
    ));

    // Content
    let h1_count = count_h1_tags(html);
    let (h1_status, h1_points) = match h1_count {
        1 => (CheckStatus::Pass, checks::CONTENT_H1.max),
        0 => (CheckStatus::Fail, 0),
        _ => (CheckStatus::Warn, 4),
    };
    results.push(checks::CONTENT_H1.result(
        h1_status,
        h1_points,
        format!("H1 count: {}.", h1_count),
        None,
    ));

    let heading_count = count_h2_h3_tags(html);
    let (heading_status, heading_points) = match heading_count {
        0 => (CheckStatus::Fail, 0),
        1 => (CheckStatus::Warn, 2),
        _ => (CheckStatus::Pass, checks::CONTENT_HEADINGS.max),
    };
    results.push(checks::CONTENT_HEADINGS.result(
        heading_status,
        heading_points,
        format!("H2/H3 heading count: {}.", heading_count),
        None,
    ));

    let (depth_status, depth_points) = if body_text_length >= 600 {
        (CheckStatus::Pass, checks::CONTENT_DEPTH.max)
    } else if body_text_length >= 220 {
        (CheckStatus::Warn, 4)
    } else {
        (CheckStatus::Fail, 0)
    };
    results.push(checks::CONTENT_DEPTH.result(
        depth_status,
        depth_points,
        format!("Detected {} readable characters in body content.", body_text_length),
        None,
    ));

    // Floors at warn: a page without about/contact signals is weak, not broken.
    let trusted = TRUST_WORD_REGEX.is_match(&body_text)
        || has_about_contact_links(html, requested_url);
    results.push(checks::CONTENT_TRUST.result(
        if trusted { CheckStatus::Pass } else { CheckStatus::Warn },
        if trusted { checks::CONTENT_TRUST.max } else { 1 },
        if trusted {
            "About/contact trust signals detected in text or links."
        } else {
            "No strong about/contact trust signal detected."
        },
        None,
    ));

    // Structured data
    let json_ld = inspect_json_ld(html);
    results.push(checks::SD_PRESENCE.result(
        if json_ld.total > 0 { CheckStatus::Pass } else { CheckStatus::Fail },
        if json_ld.total > 0 { checks::SD_PRESENCE.max } else { 0 },
        if json_ld.total > 0 {
            format!("JSON-LD blocks found: {}.", json_ld.total)
        } else {
            "No JSON-LD blocks found.".to_string()
        },
        None,
    ));

    let (validity_status, validity_points, validity_evidence) = if json_ld.total == 0 {
        (CheckStatus::Warn, 3, "No JSON-LD to validate yet.".to_string())
    } else if json_ld.parse_errors == 0 {
        (
            CheckStatus::Pass,
            checks::SD_VALIDITY.max,
            "JSON-LD syntax parsed successfully.".to_string(),
        )
    } else {
        (
            CheckStatus::Fail,
            0,
            format!("JSON-LD parse errors: {}.", json_ld.parse_errors),
        )
    };
    results.push(checks::SD_VALIDITY.result(
        validity_status,
        validity_points,
        validity_evidence,
        json_ld.first_valid.clone(),
    ));

    let (types_status, types_points) = if json_ld.has_recommended_type() {
        (CheckStatus::Pass, checks::SD_RECOMMENDED_TYPES.max)
    } else if json_ld.total > 0 {
        (CheckStatus::Warn, 2)
    } else {
        (CheckStatus::Fail, 0)
    };
    results.push(checks::SD_RECOMMENDED_TYPES.result(
        types_status,
        types_points,
        if json_ld.types.is_empty() {
            "No recommended Organization/WebSite/LocalBusiness type detected.".to_string()
        } else {
            format!("Detected JSON-LD @type values: {}.", json_ld.types.join(", "))
        },
        None,
    ));

    Analysis {
        checks: results,
        js_shell,
        title,
        meta_description,
        canonical,
        description_length,
        body_text_length,
        json_ld_parse_errors: json_ld.parse_errors,
    }
}

fn redirect_check(
    page: &FetchOutcome,
    canonical_url: Option<&Url>,
    final_url: Option<&Url>,
) -> CheckResult {
    let mut status = if page.redirect_count == 0 {
        CheckStatus::Pass
    } else if page.redirect_count <= 3 {
        CheckStatus::Warn
    } else {
        CheckStatus::Fail
    };
    let mut points = if page.redirect_count == 0 {
        checks::ACCESS_REDIRECTS.max
    } else if page.redirect_count <= 3 {
        4
    } else {
        0
    };
    let mut evidence = vec![format!(
        "Redirect hops detected: {}. Final URL: {}.",
        page.redirect_count, page.final_url
    )];

    if let (Some(canonical), Some(resolved)) = (canonical_url, final_url)
        && host_with_port(canonical) != host_with_port(resolved)
    {
        status = if status == CheckStatus::Fail {
            CheckStatus::Fail
        } else {
            CheckStatus::Warn
        };
        points = if status == CheckStatus::Fail { 0 } else { points.min(3) };
        evidence.push(format!(
            "Canonical host ({}) differs from final host ({}).",
            host_with_port(canonical),
            host_with_port(resolved)
        ));
    }

    checks::ACCESS_REDIRECTS.result(status, points, evidence.join(" "), None)
}

fn robots_txt_check(robots: Option<&FetchOutcome>) -> CheckResult {
    let Some(robots) = robots else {
        return checks::ACCESS_ROBOTS_TXT.result(
            CheckStatus::Warn,
            2,
            "Could not evaluate robots.txt for this URL origin.",
            None,
        );
    };

    let body = robots.html.trim();
    let body_length = body.chars().count();
    let pass = robots.ok && body_length >= 24;
    let warn = robots.status == 404 || (robots.ok && body_length > 0 && body_length < 24);

    let (status, points, evidence) = if pass {
        (
            CheckStatus::Pass,
            checks::ACCESS_ROBOTS_TXT.max,
            format!("robots.txt reachable ({} chars).", body_length),
        )
    } else if warn {
        (
            CheckStatus::Warn,
            2,
            format!(
                "robots.txt weak or missing (status {}, {} chars).",
                robots.status, body_length
            ),
        )
    } else {
        (
            CheckStatus::Fail,
            0,
            format!("robots.txt unavailable (status {}).", robots.status),
        )
    };
    checks::ACCESS_ROBOTS_TXT.result(status, points, evidence, None)
}

fn sitemap_check(sitemap: Option<&FetchOutcome>) -> CheckResult {
    let Some(sitemap) = sitemap else {
        return checks::ACCESS_SITEMAP_XML.result(
            CheckStatus::Warn,
            2,
            "Could not evaluate sitemap.xml for this URL origin.",
            None,
        );
    };

    let valid_shape = looks_like_sitemap(&sitemap.html);
    let pass = sitemap.ok && valid_shape;
    let warn = sitemap.status == 404 || (sitemap.ok && !valid_shape);

    let (status, points, evidence) = if pass {
        (
            CheckStatus::Pass,
            checks::ACCESS_SITEMAP_XML.max,
            format!("sitemap.xml reachable and valid (status {}).", sitemap.status),
        )
    } else if warn {
        (
            CheckStatus::Warn,
            2,
            format!(
                "sitemap.xml missing or not parseable as sitemap (status {}).",
                sitemap.status
            ),
        )
    } else {
        (
            CheckStatus::Fail,
            0,
            format!("sitemap.xml unavailable (status {}).", sitemap.status),
        )
    };
    checks::ACCESS_SITEMAP_XML.result(status, points, evidence, None)
}

fn description_check(meta_description: &str, length: usize) -> CheckResult {
    let status = if (70..=160).contains(&length) {
        CheckStatus::Pass
    } else if (50..70).contains(&length) || (161..=200).contains(&length) {
        CheckStatus::Warn
    } else {
        CheckStatus::Fail
    };
    let points = match status {
        CheckStatus::Pass => checks::META_DESCRIPTION.max,
        CheckStatus::Warn => 3,
        CheckStatus::Fail => 0,
    };
    let evidence = if length == 0 {
        "Meta description length: 0 (missing; ideal 70-160).".to_string()
    } else if length < 50 {
        format!("Meta description length: {} (too short; ideal 70-160).", length)
    } else if length < 70 {
        format!("Meta description length: {} (slightly short; ideal 70-160).", length)
    } else if length <= 160 {
        format!("Meta description length: {} (ideal 70-160).", length)
    } else if length <= 200 {
        format!("Meta description length: {} (slightly long; ideal 70-160).", length)
    } else {
        format!("Meta description length: {} (too long; ideal 70-160).", length)
    };
    checks::META_DESCRIPTION.result(
        status,
        points,
        evidence,
        (!meta_description.is_empty())
            .then(|| format!(r#"<meta name="description" content="{}" />"#, meta_description)),
    )
}

fn canonical_check(
    canonical: &str,
    canonical_url: Option<&Url>,
    final_url: Option<&Url>,
    final_url_raw: &str,
) -> CheckResult {
    if canonical.is_empty() {
        return checks::META_CANONICAL.result(
            CheckStatus::Fail,
            0,
            "Canonical link missing.",
            None,
        );
    }

    let mismatch = match (canonical_url, final_url) {
        (Some(c), Some(f)) => {
            host_with_port(c) != host_with_port(f) || c.path() != f.path()
        }
        _ => false,
    };

    let (status, points, evidence) = if mismatch {
        (
            CheckStatus::Warn,
            3,
            format!(
                "Canonical URL found ({}) but differs from final URL path/host ({}).",
                canonical, final_url_raw
            ),
        )
    } else {
        (
            CheckStatus::Pass,
            checks::META_CANONICAL.max,
            format!("Canonical URL found: {}.", canonical),
        )
    };
    checks::META_CANONICAL.result(
        status,
        points,
        evidence,
        Some(format!(r#"<link rel="canonical" href="{}" />"#, canonical)),
    )
}

fn resolve_canonical(canonical: &str, base: &Url) -> Option<Url> {
    if canonical.is_empty() {
        return None;
    }
    base.join(canonical).ok()
}

fn host_with_port(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

fn detect_js_shell(readable_length: usize, script_count: usize) -> JsShell {
    let flagged = (readable_length < 600 && script_count >= 10)
        || (readable_length < 300 && script_count >= 6);
    if !flagged {
        return JsShell::default();
    }
    JsShell {
        flagged: true,
        evidence: format!(
            "Likely JS-rendered shell: readable text {} chars, scripts {}. Server-render key content or add SSR/prerender.",
            readable_length, script_count
        ),
    }
}
