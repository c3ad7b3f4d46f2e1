use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use std::net::SocketAddr;
use tracing::info;

use crate::{
    analyzer::model::CheckStatus,
    app_state::AppState,
    checkup::{
        analysis::run_analysis,
        dtos::{AnalysisPayload, CheckupResponse, DebugInfo, ErrorBody},
    },
    fetcher,
    rate_limit::{RateRemaining, client_id},
    share::{SharePayload, ShareTopFix, store::ShareCategory},
};

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
const MAX_REQUEST_BODY: usize = 64 * 1024;

/// POST /api/checkup — the scoring endpoint.
///
/// Gate order: rate limit, input validation, SSRF guard, cache, analysis.
/// Upstream failures never surface as HTTP errors here; they are folded into
/// the analysis as failing checks.
pub async fn run_checkup(State(state): State<AppState>, request: Request) -> Response {
    let now = Utc::now();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let headers = request.headers().clone();
    let client = client_id(&headers, peer);
    let rate = state.checkup_limits.acquire(&client, now);
    let dev_mode = state.config.dev_mode();

    if !rate.allowed {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [
                (header::RETRY_AFTER, rate.retry_after_seconds.to_string()),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            Json(ErrorBody {
                message: "Rate limit reached. Try again shortly (2/min burst, 30/day).".to_string(),
                retry_after_seconds: Some(rate.retry_after_seconds),
                debug: debug_info(dev_mode, false, rate.remaining),
            }),
        )
            .into_response();
    }

    let body: Bytes = match axum::body::to_bytes(request.into_body(), MAX_REQUEST_BODY).await {
        Ok(body) => body,
        Err(_) => {
            return bad_request(
                "Invalid JSON body. Expected { url: string }.",
                debug_info(dev_mode, false, rate.remaining),
            );
        }
    };
    let parsed: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return bad_request(
                "Invalid JSON body. Expected { url: string }.",
                debug_info(dev_mode, false, rate.remaining),
            );
        }
    };

    let raw_url = parsed
        .get("url")
        .and_then(|value| value.as_str())
        .map(str::trim)
        .unwrap_or("");
    if raw_url.is_empty() {
        return bad_request("Please provide a URL.", debug_info(dev_mode, false, rate.remaining));
    }
    let create_share = parsed.get("createShare").and_then(|value| value.as_bool()) == Some(true);

    let target = match fetcher::resolve(raw_url) {
        Ok(target) => target,
        Err(rejection) => {
            return bad_request(rejection.to_string(), debug_info(dev_mode, false, rate.remaining));
        }
    };
    let allow_private = state.config.allow_private_targets();
    if let Err(rejection) = fetcher::assert_safe_target(&target, allow_private).await {
        return bad_request(rejection.to_string(), debug_info(dev_mode, false, rate.remaining));
    }

    let normalized = target.to_string();
    let cached = state.result_cache.get(&normalized, now);
    let cache_hit = cached.is_some();
    let analysis = match cached {
        Some(payload) => payload,
        None => {
            let payload = run_analysis(&target, now, allow_private).await;
            state.result_cache.insert(&normalized, payload.clone(), now);
            payload
        }
    };
    info!(url = %normalized, cache_hit, score = analysis.score, "checkup complete");

    let share_url = if create_share {
        let created = state.share_store.create(&build_share_payload(&analysis)).await;
        Some(format!(
            "{}/api/share?sid={}",
            state.config.public_base_url(),
            created.id
        ))
    } else {
        None
    };

    (
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "no-store"),
            (X_CACHE, if cache_hit { "HIT" } else { "MISS" }),
        ],
        Json(CheckupResponse {
            analysis,
            share_url,
            debug: debug_info(dev_mode, cache_hit, rate.remaining),
        }),
    )
        .into_response()
}

/// The sanitized subset published behind a share id: category scores plus
/// the first seven non-passing checks.
fn build_share_payload(payload: &AnalysisPayload) -> SharePayload {
    let top_fixes = payload
        .checks
        .iter()
        .filter(|check| check.status != CheckStatus::Pass)
        .take(7)
        .map(|check| ShareTopFix {
            title: check.name.clone(),
            why: check.evidence.clone(),
            how: check.fix.clone(),
            snippet: check
                .snippet
                .as_deref()
                .map(|snippet| snippet.chars().take(350).collect()),
        })
        .collect();

    SharePayload {
        url: payload.url.clone(),
        fetched_at: payload.fetched_at.to_rfc3339(),
        rubric_version: payload.rubric_version.clone(),
        score: payload.score,
        grade: payload.grade.to_string(),
        confidence: payload.confidence.to_string(),
        categories: payload
            .categories
            .iter()
            .map(|category| ShareCategory {
                id: category.id.to_string(),
                name: category.name.to_string(),
                score: category.score,
                max: category.max,
            })
            .collect(),
        top_fixes,
    }
}

fn debug_info(dev_mode: bool, cache_hit: bool, remaining: RateRemaining) -> Option<DebugInfo> {
    dev_mode.then_some(DebugInfo {
        cache_hit,
        remaining_rate_limit: remaining,
    })
}

fn bad_request(message: impl Into<String>, debug: Option<DebugInfo>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::new(message).with_debug(debug)),
    )
        .into_response()
}
