use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use checkup::{app_state::AppState, config::Config, routes};
use tower::ServiceExt;

/// Router wired like production, but allowed to reach the in-process mock
/// servers on 127.0.0.1.
pub fn test_app(config: Config) -> Router {
    routes::router(AppState::new(config))
}

pub fn test_config() -> Config {
    Config::for_development().with_allow_private_targets(true)
}

pub async fn post_json(app: &Router, uri: &str, client: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", client)
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
