//! Short-TTL de-duplication of identical URL analyses.
//!
//! Process-local by design: a multi-instance deployment would need a shared
//! store behind the same interface, but one instance is the deployment model
//! this serves.

use crate::checkup::dtos::AnalysisPayload;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

struct CacheEntry {
    expires_at: DateTime<Utc>,
    payload: AnalysisPayload,
}

pub struct ResultCache {
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Fresh payload for a normalized URL, evicting on expiry.
    pub fn get(&self, url: &str, now: DateTime<Utc>) -> Option<AnalysisPayload> {
        let expired = match self.entries.get(url) {
            Some(entry) if entry.expires_at > now => return Some(entry.payload.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(url);
        }
        None
    }

    pub fn insert(&self, url: &str, payload: AnalysisPayload, now: DateTime<Utc>) {
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                expires_at: now + self.ttl,
                payload,
            },
        );
    }
}
