use crate::fetcher::{decode::decode_body, guard, types::FetchOutcome};
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder, redirect};
use std::time::Duration;
use tracing::instrument;
use url::Url;

const MAX_BODY_BYTES: usize = 1_500_000; // 1.5MB
const MAX_REDIRECTS: u32 = 5;
const USER_AGENT: &str = "CheckupBot/0.1 (+https://checkup.example.com)";

/// Wall-clock budget for fetching the page under analysis.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
/// Tighter budget for the robots.txt / sitemap.xml side probes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(4);

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        // Redirects are followed manually so the SSRF guard can re-validate
        // every hop before it is fetched.
        .redirect(redirect::Policy::none())
        .default_headers({
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml".parse().unwrap(),
            );
            headers
        })
        .build()
        .expect("Failed to build HTTP client")
});

/// Fetch a target following redirects by hand: each hop re-runs the SSRF
/// guard, the chain is capped at 5 hops, and each hop gets its own timeout.
/// Never returns `Err` — every failure mode is folded into the outcome.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_following_redirects(
    url: &Url,
    timeout: Duration,
    allow_private: bool,
) -> FetchOutcome {
    let mut current = url.clone();
    let mut redirects: u32 = 0;

    loop {
        if !matches!(current.scheme(), "http" | "https") {
            return FetchOutcome::failure(
                400,
                current.to_string(),
                redirects,
                "Redirected to an unsupported URL scheme.",
            );
        }

        if let Err(rejection) = guard::assert_safe_target(&current, allow_private).await {
            return FetchOutcome::failure(400, current.to_string(), redirects, rejection.to_string());
        }

        let response = match HTTP_CLIENT.get(current.clone()).timeout(timeout).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return FetchOutcome::timeout(current.to_string(), redirects, timeout.as_secs());
            }
            Err(_) => {
                return FetchOutcome::failure(
                    520,
                    current.to_string(),
                    redirects,
                    "Target fetch failed.",
                );
            }
        };

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let Some(location) = location else {
                return FetchOutcome::failure(
                    status.as_u16(),
                    current.to_string(),
                    redirects,
                    "Redirect response missing Location header.",
                );
            };

            redirects += 1;
            if redirects > MAX_REDIRECTS {
                return FetchOutcome::failure(
                    508,
                    current.to_string(),
                    redirects,
                    format!("Too many redirects (>{}).", MAX_REDIRECTS),
                );
            }

            current = match current.join(&location) {
                Ok(next) => next,
                Err(_) => {
                    return FetchOutcome::failure(
                        400,
                        current.to_string(),
                        redirects,
                        "Redirect target could not be parsed.",
                    );
                }
            };
            continue;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body_bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) if err.is_timeout() => {
                return FetchOutcome::timeout(current.to_string(), redirects, timeout.as_secs());
            }
            Err(_) => {
                return FetchOutcome::failure(
                    520,
                    current.to_string(),
                    redirects,
                    "Target fetch failed.",
                );
            }
        };

        // Cap before decoding to bound memory on hostile bodies.
        let capped = &body_bytes[..body_bytes.len().min(MAX_BODY_BYTES)];
        let html = decode_body(capped, content_type.as_deref());

        return FetchOutcome {
            ok: status.is_success(),
            status: status.as_u16(),
            final_url: current.to_string(),
            html,
            timed_out: false,
            blocked_status: matches!(status.as_u16(), 403 | 429),
            redirect_count: redirects,
            error: None,
        };
    }
}
