use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use chrono::Utc;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::{
    app_state::AppState,
    checkup::dtos::ErrorBody,
    fetcher::{self, ResolveError},
    rate_limit::client_id,
    submissions::{
        dtos::{SubmissionInput, SubmissionRecord, SubmissionResponse},
        issues::create_submission_issue,
    },
};

const MAX_REQUEST_BODY: usize = 64 * 1024;

/// POST /api/submissions — human-reviewable brief submissions.
///
/// With an issue-tracker token configured the record is filed as an issue;
/// without one (or when the tracker call fails) it is queued in process
/// memory and the response says so. Queue degradation is never an HTTP error.
pub async fn submit_brief(State(state): State<AppState>, request: Request) -> Response {
    let now = Utc::now();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let headers = request.headers().clone();
    let client = client_id(&headers, peer);
    let rate = state.submission_limits.acquire(&client, now);

    if !rate.allowed {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [
                (header::RETRY_AFTER, rate.retry_after_seconds.to_string()),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            Json(ErrorBody {
                message: "Too many submissions from this IP. Please try again shortly.".to_string(),
                retry_after_seconds: Some(rate.retry_after_seconds),
                debug: None,
            }),
        )
            .into_response();
    }

    let body: Bytes = match axum::body::to_bytes(request.into_body(), MAX_REQUEST_BODY).await {
        Ok(body) => body,
        Err(_) => return bad_request("Invalid JSON body."),
    };
    let input: SubmissionInput = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(_) => return bad_request("Invalid JSON body."),
    };

    if input.honeypot_tripped() {
        return bad_request("Submission rejected.");
    }

    if let Err(message) = input.validate() {
        return bad_request(message);
    }

    let source_url = match validate_source_url(&input, state.config.allow_private_targets()).await {
        Ok(source_url) => source_url,
        Err(message) => return bad_request(message),
    };

    let record = SubmissionRecord {
        title: input.trimmed(&input.title),
        summary: input.trimmed(&input.summary),
        source_url,
        city: input.trimmed(&input.city),
        sector: input.trimmed(&input.sector),
        date: input.trimmed(&input.date),
        submitter_name: input.trimmed(&input.submitter_name),
        submitter_email: input.trimmed(&input.submitter_email),
        notes: input.trimmed(&input.notes),
        submitted_at: now,
        ip_hash: format!("{:x}", md5::compute(client.as_bytes()))
            .chars()
            .take(16)
            .collect(),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown")
            .to_string(),
    };

    let Some(token) = state.config.github_token().map(str::to_string) else {
        queue_in_memory(&state, record);
        return accepted(
            "memory",
            None,
            Some(
                "GITHUB_TOKEN is missing; this submission is only stored in memory for this runtime."
                    .to_string(),
            ),
        );
    };

    match create_submission_issue(
        &token,
        state.config.github_repo_owner(),
        state.config.github_repo_name(),
        &record,
    )
    .await
    {
        Ok(issue_url) => {
            info!(issue_url = %issue_url, "submission filed as issue");
            accepted("github", Some(issue_url), None)
        }
        Err(err) => {
            warn!(error = %err, "issue creation failed; queueing submission in memory");
            let warning = format!(
                "GitHub issue creation failed; submission kept in memory queue. {}",
                err
            );
            queue_in_memory(&state, record);
            accepted("memory", None, Some(warning.trim().to_string()))
        }
    }
}

async fn validate_source_url(
    input: &SubmissionInput,
    allow_private: bool,
) -> Result<String, String> {
    let raw = input.trimmed(&input.source_url);
    if raw.is_empty() {
        return Err("Source URL is required.".to_string());
    }
    let url = fetcher::resolve(&raw).map_err(|err| match err {
        ResolveError::UnsupportedScheme => "Source URL must start with http or https.".to_string(),
        _ => "Source URL must be a valid URL.".to_string(),
    })?;
    fetcher::assert_safe_target(&url, allow_private)
        .await
        .map_err(|rejection| rejection.to_string())?;
    Ok(url.to_string())
}

fn queue_in_memory(state: &AppState, record: SubmissionRecord) {
    if let Ok(mut queue) = state.submission_queue.lock() {
        queue.push(record);
    }
}

fn accepted(storage: &'static str, issue_url: Option<String>, warning: Option<String>) -> Response {
    (
        StatusCode::OK,
        Json(SubmissionResponse {
            ok: true,
            message: "Thanks — queued for review.".to_string(),
            storage,
            issue_url,
            warning,
        }),
    )
        .into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
}
