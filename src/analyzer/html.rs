//! Regex-first HTML inspection.
//!
//! A full DOM pass is deliberately avoided for the head-tag checks; the
//! patterns below preserve a forward-then-reverse attribute-order tie-break
//! for meta tags (first match wins). Anchor harvesting for the trust-signal
//! check goes through a real parser since href soup is where regexes break
//! down.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

static CANONICAL_FORWARD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link[^>]+rel=["']canonical["'][^>]*href=["']([^"']+)["'][^>]*>"#).unwrap()
});

static CANONICAL_REVERSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<link[^>]+href=["']([^"']+)["'][^>]*rel=["']canonical["'][^>]*>"#).unwrap()
});

static SCRIPT_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<script\b").unwrap());

static H1_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<h1\b[^>]*>").unwrap());

static H2_H3_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<h[2-3]\b[^>]*>").unwrap());

static SCRIPT_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script>").unwrap());

static STYLE_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style>").unwrap());

static NOSCRIPT_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<noscript\b.*?</noscript>").unwrap());

static BODY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body[^>]*>(.*?)</body>").unwrap());

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static NOINDEX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|\s|,)(noindex|none)(\s|,|$)").unwrap());

static SITEMAP_SHAPE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(urlset|sitemapindex)\b").unwrap());

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("Failed to parse anchor selector"));

/// First `<title>` contents, tag-stripped and whitespace-collapsed.
pub fn extract_title(html: &str) -> String {
    match TITLE_REGEX.captures(html).and_then(|captures| captures.get(1)) {
        Some(inner) => clean_fragment(inner.as_str()),
        None => String::new(),
    }
}

/// Content of `<meta name="...">`, trying name-before-content order first and
/// content-before-name second. First match wins.
pub fn find_meta_tag(html: &str, name: &str) -> String {
    let escaped = regex::escape(name);
    let forward = Regex::new(&format!(
        r#"(?is)<meta[^>]+name=["']{escaped}["'][^>]*content=["'](.*?)["'][^>]*>"#
    ))
    .expect("Failed to compile meta regex");
    let reverse = Regex::new(&format!(
        r#"(?is)<meta[^>]+content=["'](.*?)["'][^>]*name=["']{escaped}["'][^>]*>"#
    ))
    .expect("Failed to compile meta regex");

    let captured = forward
        .captures(html)
        .or_else(|| reverse.captures(html))
        .and_then(|captures| captures.get(1));
    match captured {
        Some(content) => decode_entities(content.as_str().trim()),
        None => String::new(),
    }
}

/// `<link rel="canonical">` href, same forward-then-reverse tie-break.
pub fn find_canonical(html: &str) -> String {
    CANONICAL_FORWARD_REGEX
        .captures(html)
        .or_else(|| CANONICAL_REVERSE_REGEX.captures(html))
        .and_then(|captures| captures.get(1))
        .map(|href| href.as_str().trim().to_string())
        .unwrap_or_default()
}

pub fn count_script_tags(html: &str) -> usize {
    SCRIPT_TAG_REGEX.find_iter(html).count()
}

pub fn count_h1_tags(html: &str) -> usize {
    H1_REGEX.find_iter(html).count()
}

pub fn count_h2_h3_tags(html: &str) -> usize {
    H2_H3_REGEX.find_iter(html).count()
}

pub fn has_noindex_directive(robots_meta: &str) -> bool {
    NOINDEX_REGEX.is_match(robots_meta)
}

pub fn looks_like_sitemap(body: &str) -> bool {
    SITEMAP_SHAPE_REGEX.is_match(body)
}

/// Readable text: script/style/noscript stripped, `<body>` contents when
/// present, tags removed, entities decoded, whitespace collapsed.
pub fn extract_body_text(html: &str) -> String {
    let cleaned = SCRIPT_BLOCK_REGEX.replace_all(html, " ");
    let cleaned = STYLE_BLOCK_REGEX.replace_all(&cleaned, " ");
    let cleaned = NOSCRIPT_BLOCK_REGEX.replace_all(&cleaned, " ");

    let body = BODY_REGEX
        .captures(&cleaned)
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str().to_string())
        .unwrap_or_else(|| cleaned.into_owned());

    clean_fragment(&body)
}

/// True when the page links internally to an /about or /contact path.
pub fn has_about_contact_links(html: &str, base: &Url) -> bool {
    let document = Html::parse_document(html);
    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if resolved.host_str() != base.host_str() {
            continue;
        }
        let mut path = resolved.path().to_ascii_lowercase();
        if let Some(query) = resolved.query() {
            path.push('?');
            path.push_str(&query.to_ascii_lowercase());
        }
        if path.contains("/about") || path.contains("/contact") {
            return true;
        }
    }
    false
}

/// The minimal entity set seen in head tags; anything rarer passes through.
pub fn decode_entities(value: &str) -> String {
    value
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn clean_fragment(fragment: &str) -> String {
    let stripped = TAG_REGEX.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WHITESPACE_REGEX.replace_all(&decoded, " ").trim().to_string()
}
