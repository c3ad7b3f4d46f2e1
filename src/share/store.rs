//! Publishing a sanitized slice of an analysis behind a short opaque id.
//!
//! Writes go to a remote key-value store when one is configured and fall back
//! to a process-local map on any failure; reads try remote first, then
//! memory. Store trouble never fails a request.

use crate::config::Config;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

/// Segment encoding matching encodeURIComponent's unreserved set.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const KEY_PREFIX: &str = "aio:";
const MAX_SHARE_CATEGORIES: usize = 4;
const MAX_SHARE_FIXES: usize = 7;

pub fn share_ttl() -> Duration {
    Duration::days(30)
}

#[derive(Error, Debug)]
pub enum ShareStoreError {
    #[error("share store request failed: {0}")]
    Request(String),

    #[error("share store command failed with {0}")]
    Command(u16),
}

/// Minimal TTL'd key-value seam the share store is built on.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ShareStoreError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), ShareStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ShareStoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareCategory {
    pub id: String,
    pub name: String,
    pub score: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareTopFix {
    pub title: String,
    pub why: String,
    pub how: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// The publicly fetchable subset of one analysis.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SharePayload {
    pub url: String,
    pub fetched_at: String,
    pub rubric_version: String,
    pub score: u32,
    pub grade: String,
    pub confidence: String,
    pub categories: Vec<ShareCategory>,
    pub top_fixes: Vec<ShareTopFix>,
}

/// Cap list lengths and free-text sizes. Applied on write and again on read,
/// so records written by other versions stay bounded too.
pub fn sanitize(payload: &SharePayload) -> SharePayload {
    SharePayload {
        url: payload.url.clone(),
        fetched_at: payload.fetched_at.clone(),
        rubric_version: payload.rubric_version.clone(),
        score: payload.score,
        grade: payload.grade.clone(),
        confidence: payload.confidence.clone(),
        categories: payload
            .categories
            .iter()
            .take(MAX_SHARE_CATEGORIES)
            .cloned()
            .collect(),
        top_fixes: payload
            .top_fixes
            .iter()
            .take(MAX_SHARE_FIXES)
            .map(|fix| ShareTopFix {
                title: truncate_chars(&fix.title, 140),
                why: truncate_chars(&fix.why, 300),
                how: truncate_chars(&fix.how, 300),
                snippet: fix.snippet.as_deref().map(|s| truncate_chars(s, 400)),
            })
            .collect(),
    }
}

/// Upstash-style REST interface: one GET per command, path-encoded args,
/// bearer auth, `{ "result": ... }` envelope.
pub struct RedisRestStore {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct CommandResponse {
    result: Option<serde_json::Value>,
}

impl RedisRestStore {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn command(&self, args: &[&str]) -> Result<serde_json::Value, ShareStoreError> {
        let path: Vec<String> = args
            .iter()
            .map(|arg| utf8_percent_encode(arg, SEGMENT).to_string())
            .collect();
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path.join("/")))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| ShareStoreError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ShareStoreError::Command(response.status().as_u16()));
        }

        let body: CommandResponse = response
            .json()
            .await
            .map_err(|err| ShareStoreError::Request(err.to_string()))?;
        Ok(body.result.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl KvStore for RedisRestStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ShareStoreError> {
        match self.command(&["GET", key]).await? {
            serde_json::Value::String(value) => Ok(Some(value)),
            serde_json::Value::Null => Ok(None),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), ShareStoreError> {
        let ttl_seconds = ttl.num_seconds().max(0).to_string();
        self.command(&["SET", key, value, "EX", &ttl_seconds]).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ShareStoreError> {
        self.command(&["DEL", key]).await?;
        Ok(())
    }
}

struct MemoryEntry {
    expires_at: DateTime<Utc>,
    value: String,
}

/// Fallback store with the same TTL semantics; an expired entry is absent and
/// evicted on read.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ShareStoreError> {
        let now = Utc::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), ShareStoreError> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                expires_at: Utc::now() + ttl,
                value: value.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ShareStoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ShareCreated {
    pub id: String,
    /// True when the record landed in the remote store.
    pub persistent: bool,
}

pub struct ShareStore {
    remote: Option<RedisRestStore>,
    memory: MemoryStore,
}

impl ShareStore {
    pub fn from_config(config: &Config) -> Self {
        let remote = match (config.kv_rest_api_url(), config.kv_rest_api_token()) {
            (Some(url), Some(token)) => Some(RedisRestStore::new(url, token)),
            _ => None,
        };
        Self {
            remote,
            memory: MemoryStore::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            remote: None,
            memory: MemoryStore::default(),
        }
    }

    pub async fn create(&self, payload: &SharePayload) -> ShareCreated {
        self.create_with_ttl(payload, share_ttl()).await
    }

    pub async fn create_with_ttl(&self, payload: &SharePayload, ttl: Duration) -> ShareCreated {
        let sanitized = sanitize(payload);
        let id = new_share_id();
        let key = format!("{}{}", KEY_PREFIX, id);

        let serialized = match serde_json::to_string(&sanitized) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(error = %err, "share payload serialization failed");
                return ShareCreated { id, persistent: false };
            }
        };

        if let Some(remote) = &self.remote {
            match remote.set(&key, &serialized, ttl).await {
                Ok(()) => return ShareCreated { id, persistent: true },
                Err(err) => {
                    warn!(error = %err, "share store write failed; falling back to memory");
                }
            }
        }

        // MemoryStore::set cannot fail.
        let _ = self.memory.set(&key, &serialized, ttl).await;
        ShareCreated { id, persistent: false }
    }

    pub async fn get(&self, id: &str) -> Option<SharePayload> {
        let key = format!("{}{}", KEY_PREFIX, id);

        if let Some(remote) = &self.remote {
            match remote.get(&key).await {
                Ok(Some(raw)) if !raw.is_empty() => {
                    if let Ok(parsed) = serde_json::from_str::<SharePayload>(&raw) {
                        return Some(sanitize(&parsed));
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(error = %err, "share store read failed; trying memory");
                }
            }
        }

        let raw = self.memory.get(&key).await.ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }
}

fn new_share_id() -> String {
    Uuid::new_v4().simple().to_string().chars().take(12).collect()
}

fn truncate_chars(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(title: &str) -> ShareTopFix {
        ShareTopFix {
            title: title.to_string(),
            why: "w".repeat(400),
            how: "h".to_string(),
            snippet: Some("s".repeat(500)),
        }
    }

    fn payload(categories: usize, fixes: usize) -> SharePayload {
        SharePayload {
            url: "https://example.com/".to_string(),
            fetched_at: "2026-08-06T00:00:00Z".to_string(),
            rubric_version: "1.0".to_string(),
            score: 72,
            grade: "Good".to_string(),
            confidence: "High".to_string(),
            categories: (0..categories)
                .map(|i| ShareCategory {
                    id: format!("cat-{i}"),
                    name: format!("Category {i}"),
                    score: 20,
                    max: 25,
                })
                .collect(),
            top_fixes: (0..fixes).map(|i| fix(&format!("Fix {i}"))).collect(),
        }
    }

    #[test]
    fn sanitize_caps_lists_and_truncates_text() {
        let sanitized = sanitize(&payload(6, 9));
        assert_eq!(sanitized.categories.len(), 4);
        assert_eq!(sanitized.top_fixes.len(), 7);
        assert_eq!(sanitized.top_fixes[0].why.chars().count(), 300);
        assert_eq!(
            sanitized.top_fixes[0].snippet.as_ref().unwrap().chars().count(),
            400
        );
    }

    #[test]
    fn share_ids_are_twelve_url_safe_chars() {
        let id = new_share_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn create_and_read_back_via_memory_fallback() {
        let store = ShareStore::in_memory();
        let created = store.create(&payload(4, 2)).await;
        assert!(!created.persistent);

        let read = store.get(&created.id).await.expect("record should exist");
        assert_eq!(read.url, "https://example.com/");
        assert_eq!(read.top_fixes.len(), 2);
    }

    #[tokio::test]
    async fn expired_memory_record_is_absent() {
        let store = ShareStore::in_memory();
        let created = store
            .create_with_ttl(&payload(4, 2), Duration::zero())
            .await;
        assert!(store.get(&created.id).await.is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_absent() {
        let store = ShareStore::in_memory();
        assert!(store.get("doesnotexist").await.is_none());
    }

    #[tokio::test]
    async fn memory_store_honors_delete() {
        let memory = MemoryStore::default();
        memory.set("k", "v", Duration::minutes(5)).await.unwrap();
        assert_eq!(memory.get("k").await.unwrap().as_deref(), Some("v"));
        memory.delete("k").await.unwrap();
        assert!(memory.get("k").await.unwrap().is_none());
    }
}
