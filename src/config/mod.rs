//! Configuration handling for the application.
//!
//! Everything comes from environment variables with development defaults, so
//! the server starts with no setup. The share-store and issue-tracker values
//! are optional; when they are absent the corresponding features degrade to
//! in-memory behavior instead of failing.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Environment variable names. Keeping them public lets tests and tooling
/// refer to them directly.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_PUBLIC_BASE_URL: &str = "PUBLIC_BASE_URL";
pub const ENV_KV_REST_API_URL: &str = "KV_REST_API_URL";
pub const ENV_KV_REST_API_TOKEN: &str = "KV_REST_API_TOKEN";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_GITHUB_REPO_OWNER: &str = "GITHUB_REPO_OWNER";
pub const ENV_GITHUB_REPO_NAME: &str = "GITHUB_REPO_NAME";
pub const ENV_DEV_MODE: &str = "DEV_MODE";
pub const ENV_ALLOW_PRIVATE_TARGETS: &str = "ALLOW_PRIVATE_TARGETS";

/// Default development values used when environment variables are absent.
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_GITHUB_REPO_OWNER: &str = "sunshinefm";
const DEFAULT_GITHUB_REPO_NAME: &str = "checkup-briefs";

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    public_base_url: String,
    kv_rest_api_url: Option<String>,
    kv_rest_api_token: Option<String>,
    github_token: Option<String>,
    github_repo_owner: String,
    github_repo_name: String,
    dev_mode: bool,
    allow_private_targets: bool,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let public_base_url =
            env::var(ENV_PUBLIC_BASE_URL).unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string());
        let kv_rest_api_url = non_empty(env::var(ENV_KV_REST_API_URL).ok())
            .map(|url| url.trim_end_matches('/').to_string());
        let kv_rest_api_token = non_empty(env::var(ENV_KV_REST_API_TOKEN).ok());
        let github_token = non_empty(env::var(ENV_GITHUB_TOKEN).ok());
        let github_repo_owner = env::var(ENV_GITHUB_REPO_OWNER)
            .unwrap_or_else(|_| DEFAULT_GITHUB_REPO_OWNER.to_string());
        let github_repo_name = env::var(ENV_GITHUB_REPO_NAME)
            .unwrap_or_else(|_| DEFAULT_GITHUB_REPO_NAME.to_string());
        let dev_mode = flag(env::var(ENV_DEV_MODE).ok());
        let allow_private_targets = flag(env::var(ENV_ALLOW_PRIVATE_TARGETS).ok());

        Ok(Self {
            bind_addr,
            public_base_url,
            kv_rest_api_url,
            kv_rest_api_token,
            github_token,
            github_repo_owner,
            github_repo_name,
            dev_mode,
            allow_private_targets,
        })
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    /// Origin used when building absolute share URLs.
    pub fn public_base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }
    /// Upstash-style REST endpoint for the durable share store, if configured.
    pub fn kv_rest_api_url(&self) -> Option<&str> {
        self.kv_rest_api_url.as_deref()
    }
    pub fn kv_rest_api_token(&self) -> Option<&str> {
        self.kv_rest_api_token.as_deref()
    }
    /// Token for filing submission issues; absent means memory-queue only.
    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }
    pub fn github_repo_owner(&self) -> &str {
        &self.github_repo_owner
    }
    pub fn github_repo_name(&self) -> &str {
        &self.github_repo_name
    }
    /// Include the debug block in checkup responses.
    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }
    /// Let the fetcher reach private/loopback targets. Local tooling only;
    /// the SSRF guard stays fully closed when this is false.
    pub fn allow_private_targets(&self) -> bool {
        self.allow_private_targets
    }

    /// Development defaults (mirrors `from_env` with no env overrides).
    pub fn for_development() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            kv_rest_api_url: None,
            kv_rest_api_token: None,
            github_token: None,
            github_repo_owner: DEFAULT_GITHUB_REPO_OWNER.to_string(),
            github_repo_name: DEFAULT_GITHUB_REPO_NAME.to_string(),
            dev_mode: false,
            allow_private_targets: false,
        }
    }

    pub fn with_dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn with_allow_private_targets(mut self, allow: bool) -> Self {
        self.allow_private_targets = allow;
        self
    }

    pub fn with_public_base_url(mut self, base: impl Into<String>) -> Self {
        self.public_base_url = base.into();
        self
    }

    pub fn with_kv_rest_api(mut self, url: impl Into<String>, token: impl Into<String>) -> Self {
        self.kv_rest_api_url = Some(url.into().trim_end_matches('/').to_string());
        self.kv_rest_api_token = Some(token.into());
        self
    }

    pub fn with_github_issues(
        mut self,
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        self.github_token = Some(token.into());
        self.github_repo_owner = owner.into();
        self.github_repo_name = repo.into();
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim),
        Some("1") | Some("true") | Some("TRUE") | Some("yes")
    )
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Reserved for future validation failures.
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
