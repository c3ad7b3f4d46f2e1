use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static JSON_LD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type=["']application/ld\+json["'][^>]*>(.*?)</script>"#).unwrap()
});

pub const RECOMMENDED_TYPES: [&str; 3] = ["Organization", "WebSite", "LocalBusiness"];

/// Summary of all `application/ld+json` blocks on a page.
#[derive(Debug, Clone, Default)]
pub struct JsonLdSummary {
    pub total: usize,
    pub parse_errors: usize,
    /// Every `@type` value in document order, deduplicated, gathered from the
    /// full object graph of each valid block.
    pub types: Vec<String>,
    /// Raw source of the first block that parsed, for the evidence snippet.
    pub first_valid: Option<String>,
}

impl JsonLdSummary {
    pub fn has_recommended_type(&self) -> bool {
        self.types
            .iter()
            .any(|found| RECOMMENDED_TYPES.contains(&found.as_str()))
    }
}

pub fn inspect_json_ld(html: &str) -> JsonLdSummary {
    let mut summary = JsonLdSummary::default();

    for captures in JSON_LD_REGEX.captures_iter(html) {
        let Some(raw) = captures.get(1) else {
            continue;
        };
        let script = raw.as_str().trim();
        if script.is_empty() {
            continue;
        }
        summary.total += 1;

        match serde_json::from_str::<Value>(script) {
            Ok(parsed) => {
                if summary.first_valid.is_none() {
                    summary.first_valid = Some(script.to_string());
                }
                collect_types(&parsed, &mut summary.types);
            }
            Err(_) => summary.parse_errors += 1,
        }
    }

    summary
}

/// Walk the whole graph: `@type` may be a string or an array, and nested
/// entities (address, offers, publisher) carry their own types.
fn collect_types(value: &Value, types: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_types(item, types);
            }
        }
        Value::Object(map) => {
            match map.get("@type") {
                Some(Value::String(single)) => push_unique(types, single),
                Some(Value::Array(entries)) => {
                    for entry in entries {
                        if let Value::String(name) = entry {
                            push_unique(types, name);
                        }
                    }
                }
                _ => {}
            }
            for nested in map.values() {
                collect_types(nested, types);
            }
        }
        _ => {}
    }
}

fn push_unique(types: &mut Vec<String>, value: &str) {
    if !types.iter().any(|existing| existing == value) {
        types.push(value.to_string());
    }
}
