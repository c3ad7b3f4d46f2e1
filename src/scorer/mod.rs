//! Aggregation of check results into the final score.
//!
//! Adjustment order is load-bearing: the harsh description penalty first,
//! then strict caps (any fail -> 85, else any warn -> 95), then confidence
//! caps (Low -> 60, Medium -> 85) applied to the already-capped value.
//! Swapping strict and confidence caps changes borderline outputs.

use crate::analyzer::Analysis;
use crate::analyzer::model::{
    CategoryId, CategoryScore, CheckResult, CheckStatus, Confidence, Grade,
};
use crate::fetcher::FetchOutcome;
use std::collections::HashMap;

const JS_SHELL_CONTENT_CAP: u32 = 10;
const HARSH_DESCRIPTION_LENGTH: usize = 220;
const FAIL_CAP: u32 = 85;
const WARN_CAP: u32 = 95;
const LOW_CONFIDENCE_CAP: u32 = 60;
const MEDIUM_CONFIDENCE_CAP: u32 = 85;
const MAX_TOP_FIXES: usize = 7;

const BASE_LIMITATIONS: [&str; 3] = [
    "This check uses one live fetch and may not reflect geo-specific variants, login states, or cookies.",
    "JavaScript-rendered content can be partially missed because analysis is HTML-first.",
    "Recommendations are heuristic and should be reviewed with your CMS and analytics context.",
];

#[derive(Debug, Clone)]
pub struct ScoreSummary {
    pub score: u32,
    pub grade: Grade,
    pub confidence: Confidence,
    pub categories: Vec<CategoryScore>,
    pub top_fixes: Vec<String>,
    pub limitations: Vec<String>,
}

pub fn score(analysis: &Analysis, page: &FetchOutcome) -> ScoreSummary {
    let mut categories = summarize_categories(&analysis.checks);
    if analysis.js_shell.flagged {
        for category in &mut categories {
            if category.id == CategoryId::Content {
                category.score = category.score.min(JS_SHELL_CONTENT_CAP);
            }
        }
    }
    let raw_score: u32 = categories.iter().map(|category| category.score).sum::<u32>().min(100);

    let confidence = {
        let base = base_confidence(analysis, page);
        if analysis.js_shell.flagged { base.downgraded() } else { base }
    };

    let mut score = raw_score;
    let mut harsh_penalty_applied = false;
    if analysis.description_length > HARSH_DESCRIPTION_LENGTH {
        score = score.saturating_sub(3);
        harsh_penalty_applied = true;
    }

    let has_fail = analysis.checks.iter().any(|check| check.status == CheckStatus::Fail);
    let has_warn = analysis.checks.iter().any(|check| check.status == CheckStatus::Warn);
    let mut strict_cap: Option<CheckStatus> = None;
    if has_fail && score > FAIL_CAP {
        score = FAIL_CAP;
        strict_cap = Some(CheckStatus::Fail);
    } else if has_warn && score > WARN_CAP {
        score = WARN_CAP;
        strict_cap = Some(CheckStatus::Warn);
    }

    let mut confidence_cap: Option<Confidence> = None;
    if confidence == Confidence::Low && score > LOW_CONFIDENCE_CAP {
        score = LOW_CONFIDENCE_CAP;
        confidence_cap = Some(Confidence::Low);
    } else if confidence == Confidence::Medium && score > MEDIUM_CONFIDENCE_CAP {
        score = MEDIUM_CONFIDENCE_CAP;
        confidence_cap = Some(Confidence::Medium);
    }

    let mut limitations: Vec<String> =
        BASE_LIMITATIONS.iter().map(|line| line.to_string()).collect();
    if analysis.js_shell.flagged {
        limitations.push(format!(
            "{} This page appears to rely heavily on client-side rendering; AI crawlers may see little content. Content score is capped until server-rendered content is available.",
            analysis.js_shell.evidence
        ));
    }
    match confidence_cap {
        Some(Confidence::Low) => limitations
            .push("Score capped due to Low confidence (fetch/parse limitations).".to_string()),
        Some(Confidence::Medium) => {
            limitations.push("Score capped due to Medium confidence (partial signals).".to_string())
        }
        _ => {}
    }
    if harsh_penalty_applied {
        limitations.push(
            "Additional penalty applied: meta description is far above recommended length (>220 chars)."
                .to_string(),
        );
    }
    match strict_cap {
        Some(CheckStatus::Fail) => limitations.push(
            "Strict mode cap applied: one or more checks failed, so score is capped at 85."
                .to_string(),
        ),
        Some(CheckStatus::Warn) => limitations.push(
            "Strict mode cap applied: one or more checks are warnings, so score is capped at 95."
                .to_string(),
        ),
        _ => {}
    }

    ScoreSummary {
        score,
        grade: grade_for(score),
        confidence,
        categories,
        top_fixes: top_fixes(&analysis.checks),
        limitations,
    }
}

/// Rescale each category's raw points onto its fixed weight.
pub fn summarize_categories(checks: &[CheckResult]) -> Vec<CategoryScore> {
    let mut grouped: HashMap<CategoryId, (u32, u32)> = HashMap::new();
    for check in checks {
        let entry = grouped.entry(check.category).or_insert((0, 0));
        entry.0 += check.points;
        entry.1 += check.max;
    }

    CategoryId::ALL
        .iter()
        .map(|&id| {
            let (points, max) = grouped.get(&id).copied().unwrap_or((0, 0));
            let weight = id.weight();
            let normalized = if max > 0 {
                ((points.min(max) as f64 / max as f64) * weight as f64).round() as u32
            } else {
                0
            };
            CategoryScore {
                id,
                name: id.display_name(),
                score: normalized.min(weight),
                max: weight,
            }
        })
        .collect()
}

pub fn grade_for(score: u32) -> Grade {
    match score {
        0..=39 => Grade::NeedsWork,
        40..=69 => Grade::Fair,
        70..=84 => Grade::Good,
        _ => Grade::Great,
    }
}

/// Non-passing checks ordered so zero-credit, high-stakes problems surface
/// first: points ascending, then max descending. Sort is stable, so equal
/// entries keep battery order.
pub fn prioritized_fix_checks(checks: &[CheckResult]) -> Vec<&CheckResult> {
    let mut failing: Vec<&CheckResult> = checks
        .iter()
        .filter(|check| check.status != CheckStatus::Pass)
        .collect();
    failing.sort_by(|a, b| a.points.cmp(&b.points).then(b.max.cmp(&a.max)));
    failing
}

fn top_fixes(checks: &[CheckResult]) -> Vec<String> {
    let mut fixes: Vec<String> = Vec::new();
    for check in prioritized_fix_checks(checks) {
        if !fixes.iter().any(|fix| fix == &check.fix) {
            fixes.push(check.fix.clone());
        }
        if fixes.len() == MAX_TOP_FIXES {
            break;
        }
    }
    fixes
}

fn base_confidence(analysis: &Analysis, page: &FetchOutcome) -> Confidence {
    let meaningful_content = analysis.body_text_length >= 220;
    let major_blocker = analysis.checks.iter().any(|check| {
        matches!(check.id.as_str(), "access-fetch" | "access-status")
            && check.status == CheckStatus::Fail
    });

    if page.timed_out || page.blocked_status || !meaningful_content || major_blocker {
        return Confidence::Low;
    }

    let metadata_gaps = analysis
        .checks
        .iter()
        .filter(|check| {
            check.category == CategoryId::Metadata && check.status != CheckStatus::Pass
        })
        .count();
    if metadata_gaps > 1 || analysis.json_ld_parse_errors > 0 {
        return Confidence::Medium;
    }

    Confidence::High
}
