//! Market-data provider configuration parsing from environment variables.

use std::env;

#[derive(Debug, Clone)]
pub struct ProviderEnvConfig {
    pub quote_base_url: String,
    pub rate_base_url: String,
    pub exchange_api_key: String,
    pub http_timeout_secs: u64,
    pub quote_max_retries: u32,
}

impl Default for ProviderEnvConfig {
    fn default() -> Self {
        Self {
            quote_base_url: "https://query1.finance.yahoo.com".to_string(),
            rate_base_url: "https://v6.exchangerate-api.com/v6".to_string(),
            exchange_api_key: String::new(),
            http_timeout_secs: 10,
            quote_max_retries: 2,
        }
    }
}

impl ProviderEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            quote_base_url: env::var("QUOTE_BASE_URL").unwrap_or(defaults.quote_base_url),
            rate_base_url: env::var("RATE_BASE_URL").unwrap_or(defaults.rate_base_url),
            exchange_api_key: env::var("EXCHANGE_API_KEY").unwrap_or_default(),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u64>()
                .unwrap_or(defaults.http_timeout_secs),
            quote_max_retries: env::var("QUOTE_MAX_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse::<u32>()
                .unwrap_or(defaults.quote_max_retries),
        }
    }
}
