use super::instrument::{Instrument, PriceUpdate};
use super::symbol::Market;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One close price from the provider's daily series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: Decimal,
}

/// Canonical result of a single quote lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub market: Market,
    pub update: PriceUpdate,
    pub series: Vec<PricePoint>,
}

impl QuoteSnapshot {
    pub fn to_instrument(&self) -> Instrument {
        Instrument::new(self.symbol.clone(), self.market, &self.update)
    }
}
