use crate::domain::errors::MarketDataError;
use crate::domain::market::instrument::PriceUpdate;
use crate::domain::market::quote::QuoteSnapshot;
use crate::domain::market::rates::{RateTable, normalize_currency};
use crate::domain::market::symbol::normalize_symbol;
use crate::domain::ports::{QuoteService, RateService};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::info;

/// Offline quote source with a fixed price book.
///
/// Symbols can be marked failing, and an artificial latency can be added to
/// widen the window in which refreshes overlap.
#[derive(Clone)]
pub struct MockQuoteService {
    book: Arc<RwLock<HashMap<String, (Decimal, Decimal)>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    latency: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockQuoteService {
    pub fn new() -> Self {
        let seed = [
            ("AAPL", 189.50, 187.00),
            ("MSFT", 415.20, 418.10),
            ("NVDA", 875.30, 860.00),
            ("005930.KS", 71000.0, 70200.0),
            ("000660.KS", 178500.0, 181000.0),
            ("035720.KQ", 48250.0, 48250.0),
        ];
        let book = seed
            .iter()
            .filter_map(|(s, p, c)| {
                Some((s.to_string(), (Decimal::from_f64(*p)?, Decimal::from_f64(*c)?)))
            })
            .collect();

        Self {
            book: Arc::new(RwLock::new(book)),
            failing: Arc::new(RwLock::new(HashSet::new())),
            latency: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_price(&self, symbol: &str, price: Decimal, previous_close: Decimal) {
        if let Ok(mut book) = self.book.write() {
            book.insert(symbol.to_string(), (price, previous_close));
        }
    }

    pub fn fail(&self, symbol: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(symbol.to_string());
        }
    }

    pub fn recover(&self, symbol: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.remove(symbol);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockQuoteService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteService for MockQuoteService {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let requested =
            normalize_symbol(symbol).ok_or_else(|| MarketDataError::quote(symbol, "empty symbol"))?;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let is_failing = self
            .failing
            .read()
            .map(|f| f.contains(&requested.symbol))
            .unwrap_or(false);
        if is_failing {
            return Err(MarketDataError::quote(&requested.symbol, "simulated outage"));
        }

        let entry = self
            .book
            .read()
            .ok()
            .and_then(|book| book.get(&requested.symbol).copied());
        let Some((price, previous_close)) = entry else {
            return Err(MarketDataError::quote(&requested.symbol, "symbol not found"));
        };

        Ok(QuoteSnapshot {
            symbol: requested.symbol,
            market: requested.market,
            update: PriceUpdate {
                price,
                previous_close,
                day_high: price.max(previous_close),
                day_low: price.min(previous_close),
                volume: "1000000".to_string(),
                as_of: Utc::now(),
            },
            series: Vec::new(),
        })
    }
}

/// Offline rate source. Rates for any base are derived from a USD table.
#[derive(Clone, Default)]
pub struct MockRateService;

impl MockRateService {
    fn usd_rates() -> HashMap<String, Decimal> {
        [
            ("USD", 1.0),
            ("KRW", 1350.0),
            ("EUR", 0.92),
            ("JPY", 149.5),
            ("CNY", 7.24),
            ("GBP", 0.79),
        ]
        .iter()
        .filter_map(|(c, r)| Some((c.to_string(), Decimal::from_f64(*r)?)))
        .collect()
    }
}

#[async_trait]
impl RateService for MockRateService {
    async fn fetch_rates(&self, base: &str) -> Result<RateTable, MarketDataError> {
        let base = normalize_currency(base).map_err(|e| MarketDataError::rate(base, e.to_string()))?;
        let usd = Self::usd_rates();
        let base_per_usd = usd
            .get(&base)
            .copied()
            .ok_or_else(|| MarketDataError::rate(&base, "unsupported base currency"))?;

        let rates = usd
            .into_iter()
            .map(|(code, rate)| (code, rate / base_per_usd))
            .collect();

        info!("MockRateService: Serving simulated rates for {}", base);
        Ok(RateTable::new(base, rates))
    }
}
