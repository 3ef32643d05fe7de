use crate::domain::errors::MarketDataError;
use crate::domain::market::quote::QuoteSnapshot;
use crate::domain::market::rates::RateTable;
use async_trait::async_trait;

/// Source of per-symbol quotes. Implementations normalize the raw symbol
/// themselves, so `symbol` may be user input such as `"005930"`.
#[async_trait]
pub trait QuoteService: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, MarketDataError>;
}

/// Source of exchange-rate tables. No retries at this layer.
#[async_trait]
pub trait RateService: Send + Sync {
    async fn fetch_rates(&self, base: &str) -> Result<RateTable, MarketDataError>;
}

/// Opaque authentication boundary: yields a stable user id, or nothing.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_user(&self) -> Option<String>;
}
