use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::{app_state::AppState, checkup::dtos::ErrorBody};

static SHARE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{6,40}$").expect("Failed to compile share id regex"));

#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    pub sid: Option<String>,
}

/// Public share lookup. Malformed, unknown, and expired ids are all the same
/// 404 to callers; shared results are cacheable for two minutes.
pub async fn get_share(State(state): State<AppState>, Query(query): Query<ShareQuery>) -> Response {
    let sid = query.sid.as_deref().unwrap_or("").trim().to_string();
    if !SHARE_ID_REGEX.is_match(&sid) {
        return not_found();
    }

    match state.share_store.get(&sid).await {
        Some(payload) => (
            StatusCode::OK,
            [(header::CACHE_CONTROL, "public, max-age=120")],
            Json(payload),
        )
            .into_response(),
        None => not_found(),
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new("Share not found or expired.")),
    )
        .into_response()
}
