use serde::Serialize;
use std::fmt::{Display, Formatter};
use utoipa::ToSchema;

/// Outcome of a single heuristic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Qualitative trust in the overall score given fetch/parse limitations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// One-step downgrade used by the JS-shell heuristic.
    pub fn downgraded(self) -> Self {
        match self {
            Confidence::High => Confidence::Medium,
            Confidence::Medium | Confidence::Low => Confidence::Low,
        }
    }
}

impl Display for Confidence {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Grade {
    #[serde(rename = "Needs work")]
    NeedsWork,
    Fair,
    Good,
    Great,
}

impl Display for Grade {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Grade::NeedsWork => "Needs work",
            Grade::Fair => "Fair",
            Grade::Good => "Good",
            Grade::Great => "Great",
        };
        write!(f, "{}", label)
    }
}

/// Fixed-weight grouping of checks. The four weights sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryId {
    Access,
    Metadata,
    Content,
    StructuredData,
}

impl CategoryId {
    pub const ALL: [CategoryId; 4] = [
        CategoryId::Access,
        CategoryId::Metadata,
        CategoryId::Content,
        CategoryId::StructuredData,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            CategoryId::Access => "Access",
            CategoryId::Metadata => "Metadata",
            CategoryId::Content => "Content clarity",
            CategoryId::StructuredData => "Structured data",
        }
    }

    pub fn weight(self) -> u32 {
        25
    }
}

impl Display for CategoryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CategoryId::Access => "access",
            CategoryId::Metadata => "metadata",
            CategoryId::Content => "content",
            CategoryId::StructuredData => "structured-data",
        };
        write!(f, "{}", label)
    }
}

/// Immutable definition of one heuristic check.
#[derive(Debug)]
pub struct CheckDef {
    pub id: &'static str,
    pub name: &'static str,
    pub category: CategoryId,
    pub max: u32,
    pub fix: &'static str,
}

impl CheckDef {
    /// Build a per-run result. Status and points always come from the same
    /// check-specific rule, so callers pass them together.
    pub fn result(
        &self,
        status: CheckStatus,
        points: u32,
        evidence: impl Into<String>,
        snippet: Option<String>,
    ) -> CheckResult {
        debug_assert!(points <= self.max);
        CheckResult {
            id: self.id.to_string(),
            name: self.name.to_string(),
            category: self.category,
            status,
            points,
            max: self.max,
            evidence: evidence.into(),
            fix: self.fix.to_string(),
            snippet,
        }
    }
}

/// One scored check. `category` and `max` are internal to aggregation and do
/// not appear on the wire.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub category: CategoryId,
    pub status: CheckStatus,
    pub points: u32,
    #[serde(skip)]
    pub max: u32,
    pub evidence: String,
    pub fix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// A category's realized score: its checks' raw points rescaled onto the
/// category weight.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub id: CategoryId,
    pub name: &'static str,
    pub score: u32,
    pub max: u32,
}

/// Result of the client-side-rendering heuristic.
#[derive(Debug, Clone, Default)]
pub struct JsShell {
    pub flagged: bool,
    pub evidence: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_downgrades_one_level_and_floors_at_low() {
        assert_eq!(Confidence::High.downgraded(), Confidence::Medium);
        assert_eq!(Confidence::Medium.downgraded(), Confidence::Low);
        assert_eq!(Confidence::Low.downgraded(), Confidence::Low);
    }

    #[test]
    fn category_ids_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_string(&CategoryId::StructuredData).unwrap(),
            "\"structured-data\""
        );
        assert_eq!(serde_json::to_string(&CategoryId::Access).unwrap(), "\"access\"");
    }

    #[test]
    fn grade_serializes_human_labels() {
        assert_eq!(serde_json::to_string(&Grade::NeedsWork).unwrap(), "\"Needs work\"");
        assert_eq!(serde_json::to_string(&Grade::Great).unwrap(), "\"Great\"");
    }

    #[test]
    fn statuses_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&CheckStatus::Warn).unwrap(), "\"warn\"");
    }
}
