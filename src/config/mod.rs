//! Configuration module for tickwatch.
//!
//! Loaded from environment variables (and `.env` through `dotenvy` in the
//! binaries), organized by concern: Provider, Sync, and Observability.

mod observability_config;
mod provider_config;
mod sync_config;

pub use observability_config::ObservabilityEnvConfig;
pub use provider_config::ProviderEnvConfig;
pub use sync_config::{DEFAULT_REFRESH_INTERVAL_SECS, SyncEnvConfig};

use crate::domain::market::rates::normalize_currency;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which adapters back the quote and rate ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Mock,
    Live,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Mode::Mock),
            "live" => Ok(Mode::Live),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'mock' or 'live'", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub provider: ProviderEnvConfig,
    pub sync: SyncEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mode_str = env::var("MODE").unwrap_or_else(|_| "mock".to_string());
        let mode = Mode::from_str(&mode_str)?;

        let provider = ProviderEnvConfig::from_env();
        let mut sync = SyncEnvConfig::from_env();
        let observability = ObservabilityEnvConfig::from_env();

        sync.base_currency = normalize_currency(&sync.base_currency)
            .with_context(|| format!("Invalid BASE_CURRENCY: {:?}", sync.base_currency))?;

        Ok(Self {
            mode,
            provider,
            sync,
            observability,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.http_timeout_secs)
    }

    /// `None` when the background refresh is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        match self.sync.refresh_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn rate_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.sync.rate_cache_secs)
    }
}
