use crate::domain::errors::MarketDataError;
use crate::domain::market::conversion::{Conversion, ConversionRequest, convert, value_instrument};
use crate::domain::market::instrument::Instrument;
use crate::domain::market::rates::{RateTable, normalize_currency};
use crate::domain::ports::RateService;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Rate lookups for the conversion views.
///
/// Tables are cached per base currency. When a refetch fails the last good
/// table is served instead; with no table at all, conversions come back as
/// `Conversion::Unavailable` rather than an error.
pub struct ConversionService {
    rates: Arc<dyn RateService>,
    base: String,
    max_age: Duration,
    cache: RwLock<HashMap<String, RateTable>>,
}

impl ConversionService {
    pub fn new(rates: Arc<dyn RateService>, base: impl Into<String>, max_age: Duration) -> Self {
        let base = base.into();
        Self {
            rates,
            base: normalize_currency(&base).unwrap_or(base),
            max_age,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Rate table for `base`, from cache when fresh enough.
    pub async fn rate_table(&self, base: &str) -> Result<RateTable, MarketDataError> {
        let base = normalize_currency(base).map_err(|e| MarketDataError::rate(base, e.to_string()))?;
        let base = base.as_str();
        let cached = self.cache.read().await.get(base).cloned();

        if let Some(table) = &cached
            && self.is_fresh(table)
        {
            debug!("ConversionService: Cache hit for {}", base);
            return Ok(table.clone());
        }

        match self.rates.fetch_rates(base).await {
            Ok(table) => {
                self.cache
                    .write()
                    .await
                    .insert(base.to_string(), table.clone());
                Ok(table)
            }
            Err(e) => match cached {
                Some(stale) => {
                    warn!("ConversionService: {}; serving rates from {}", e, stale.fetched_at);
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }

    /// Convert using the configured base table.
    pub async fn convert(&self, request: &ConversionRequest) -> Conversion {
        if request.from == request.to {
            return Conversion::Converted(request.amount);
        }
        match self.rate_table(&self.base).await {
            Ok(table) => convert(request, &table),
            Err(e) => {
                warn!("ConversionService: {}", e);
                Conversion::Unavailable {
                    missing: self.base.clone(),
                }
            }
        }
    }

    /// Value each instrument's price in `target`, in watchlist order.
    pub async fn value_instruments(
        &self,
        instruments: &[Instrument],
        target: &str,
    ) -> Vec<(String, Conversion)> {
        let table = match self.rate_table(&self.base).await {
            Ok(table) => Some(table),
            Err(e) => {
                warn!("ConversionService: {}", e);
                None
            }
        };

        instruments
            .iter()
            .map(|instrument| {
                let value = match &table {
                    Some(table) => value_instrument(instrument, target, table),
                    None => Conversion::Unavailable {
                        missing: self.base.clone(),
                    },
                };
                (instrument.symbol.clone(), value)
            })
            .collect()
    }

    fn is_fresh(&self, table: &RateTable) -> bool {
        let age = Utc::now().signed_duration_since(table.fetched_at);
        age.to_std().is_ok_and(|age| age <= self.max_age)
    }
}
