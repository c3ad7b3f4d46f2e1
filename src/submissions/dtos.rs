use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::ToSchema;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email regex")
});

static DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Failed to compile date regex"));

static LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://[^\s)]+").expect("Failed to compile link regex"));

const MAX_LINKS_IN_SUMMARY: usize = 3;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmissionInput {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    pub city: Option<String>,
    pub sector: Option<String>,
    pub date: Option<String>,
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
    pub notes: Option<String>,
    /// Honeypot. Humans never see this field; any value rejects the whole
    /// submission.
    pub company: Option<String>,
}

impl SubmissionInput {
    pub fn trimmed(&self, field: &Option<String>) -> String {
        field.as_deref().map(str::trim).unwrap_or("").to_string()
    }

    pub fn honeypot_tripped(&self) -> bool {
        !self.trimmed(&self.company).is_empty()
    }

    /// Field validation, honeypot and source URL aside; messages are sent to
    /// the caller verbatim.
    pub fn validate(&self) -> Result<(), String> {
        let title = self.trimmed(&self.title);
        if !(10..=140).contains(&title.chars().count()) {
            return Err("Title must be between 10 and 140 characters.".to_string());
        }

        let summary = self.trimmed(&self.summary);
        if !(30..=600).contains(&summary.chars().count()) {
            return Err("Summary must be between 30 and 600 characters.".to_string());
        }
        if LINK_REGEX.find_iter(&summary).count() > MAX_LINKS_IN_SUMMARY {
            return Err(
                "Summary contains too many links. Please keep it to 3 or fewer.".to_string(),
            );
        }

        let date = self.trimmed(&self.date);
        if !date.is_empty() && !DATE_REGEX.is_match(&date) {
            return Err("Date must use YYYY-MM-DD format.".to_string());
        }

        let email = self.trimmed(&self.submitter_email);
        if !email.is_empty() && !EMAIL_REGEX.is_match(&email) {
            return Err("Submitter email format is invalid.".to_string());
        }

        Ok(())
    }
}

/// The reviewed artifact: what gets filed as an issue or queued in memory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub title: String,
    pub summary: String,
    pub source_url: String,
    pub city: String,
    pub sector: String,
    pub date: String,
    pub submitter_name: String,
    pub submitter_email: String,
    pub notes: String,
    pub submitted_at: DateTime<Utc>,
    pub ip_hash: String,
    pub user_agent: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub ok: bool,
    pub message: String,
    pub storage: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SubmissionInput {
        SubmissionInput {
            title: Some("A perfectly fine brief title".to_string()),
            summary: Some(
                "A summary that is comfortably longer than thirty characters in total.".to_string(),
            ),
            source_url: Some("https://example.com/article".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_submission_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn title_length_is_enforced() {
        let mut input = valid();
        input.title = Some("too short".to_string());
        assert!(input.validate().unwrap_err().contains("Title"));
        input.title = Some("x".repeat(141));
        assert!(input.validate().unwrap_err().contains("Title"));
    }

    #[test]
    fn summary_length_is_enforced() {
        let mut input = valid();
        input.summary = Some("tiny".to_string());
        assert!(input.validate().unwrap_err().contains("Summary"));
    }

    #[test]
    fn too_many_summary_links_are_rejected() {
        let mut input = valid();
        input.summary = Some(
            "See https://a.example https://b.example https://c.example https://d.example for more"
                .to_string(),
        );
        assert!(input.validate().unwrap_err().contains("too many links"));
    }

    #[test]
    fn date_format_is_optional_but_strict() {
        let mut input = valid();
        input.date = Some("2026-08-06".to_string());
        assert!(input.validate().is_ok());
        input.date = Some("08/06/2026".to_string());
        assert!(input.validate().unwrap_err().contains("YYYY-MM-DD"));
    }

    #[test]
    fn email_format_is_optional_but_strict() {
        let mut input = valid();
        input.submitter_email = Some("person@example.com".to_string());
        assert!(input.validate().is_ok());
        input.submitter_email = Some("not-an-email".to_string());
        assert!(input.validate().unwrap_err().contains("email"));
    }

    #[test]
    fn honeypot_detects_filled_company_field() {
        let mut input = valid();
        assert!(!input.honeypot_tripped());
        input.company = Some("Bot LLC".to_string());
        assert!(input.honeypot_tripped());
    }
}
