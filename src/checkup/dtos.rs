use crate::analyzer::model::{CategoryScore, CheckResult, Confidence, Grade};
use crate::rate_limit::RateRemaining;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Version stamp carried on every payload. Bump when check weights,
/// thresholds, or fix texts change.
pub const RUBRIC_VERSION: &str = "1.0";

/// Unscored follow-ups every report carries; these point at external systems
/// the analyzer cannot observe.
pub const REALITY_CHECK_ITEMS: [&str; 3] = [
    "Not scored. External systems vary. Search: site:example.com \"brand\".",
    "Not scored. External systems vary. Search the exact business name and review top citations.",
    "Not scored. External systems vary. Ask an LLM: \"What is <business> in Coachella Valley?\" and verify whether it cites the site.",
];

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Exports {
    pub markdown: String,
    pub json: String,
    pub html: String,
}

/// The full result of one analysis. Immutable once built; cached by
/// normalized URL.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub rubric_version: String,
    pub score: u32,
    pub grade: Grade,
    pub confidence: Confidence,
    pub categories: Vec<CategoryScore>,
    pub checks: Vec<CheckResult>,
    pub top_fixes: Vec<String>,
    pub limitations: Vec<String>,
    pub reality_check: Vec<String>,
    pub exports: Exports,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub cache_hit: bool,
    pub remaining_rate_limit: RateRemaining,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckupResponse {
    #[serde(flatten)]
    pub analysis: AnalysisPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// Body for every non-200 outcome on the JSON endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retry_after_seconds: None,
            debug: None,
        }
    }

    pub fn with_debug(mut self, debug: Option<DebugInfo>) -> Self {
        self.debug = debug;
        self
    }
}
