use crate::{
    cache::ResultCache, config::Config, rate_limit::RateLimiter, share::ShareStore,
    submissions::dtos::SubmissionRecord,
};
use chrono::Duration;
use std::sync::{Arc, Mutex};

pub const BURST_TOKENS: u32 = 2;
pub const BURST_WINDOW_SECONDS: i64 = 60;
pub const CHECKUP_DAILY_LIMIT: u32 = 30;
pub const SUBMISSION_DAILY_LIMIT: u32 = 10;
pub const CACHE_TTL_MINUTES: i64 = 10;

/// Everything a request handler needs, passed explicitly instead of living
/// in process-wide globals. All stores are per-process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub checkup_limits: Arc<RateLimiter>,
    pub submission_limits: Arc<RateLimiter>,
    pub result_cache: Arc<ResultCache>,
    pub share_store: Arc<ShareStore>,
    pub submission_queue: Arc<Mutex<Vec<SubmissionRecord>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let share_store = ShareStore::from_config(&config);
        Self {
            config: Arc::new(config),
            checkup_limits: Arc::new(RateLimiter::new(
                BURST_TOKENS,
                Duration::seconds(BURST_WINDOW_SECONDS),
                CHECKUP_DAILY_LIMIT,
            )),
            submission_limits: Arc::new(RateLimiter::new(
                BURST_TOKENS,
                Duration::seconds(BURST_WINDOW_SECONDS),
                SUBMISSION_DAILY_LIMIT,
            )),
            result_cache: Arc::new(ResultCache::new(Duration::minutes(CACHE_TTL_MINUTES))),
            share_store: Arc::new(share_store),
            submission_queue: Arc::new(Mutex::new(Vec::new())),
        }
    }
}
