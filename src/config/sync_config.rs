//! Sync engine, storage and session configuration.

use std::env;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone)]
pub struct SyncEnvConfig {
    /// Timer period; `0` disables the background refresh.
    pub refresh_interval_secs: u64,
    pub database_url: String,
    pub user_id: Option<String>,
    pub base_currency: String,
    /// How long a fetched rate table is served before refetching.
    pub rate_cache_secs: u64,
}

impl SyncEnvConfig {
    pub fn from_env() -> Self {
        Self {
            refresh_interval_secs: env::var("REFRESH_INTERVAL_SECS")
                .unwrap_or_else(|_| DEFAULT_REFRESH_INTERVAL_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/tickwatch.db".to_string()),
            user_id: env::var("WATCHLIST_USER_ID")
                .ok()
                .filter(|id| !id.trim().is_empty()),
            base_currency: env::var("BASE_CURRENCY")
                .unwrap_or_else(|_| "USD".to_string())
                .to_uppercase(),
            rate_cache_secs: env::var("RATE_CACHE_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse::<u64>()
                .unwrap_or(600),
        }
    }
}
