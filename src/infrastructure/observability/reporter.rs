//! Push-based metrics reporter for tickwatch
//!
//! Periodically outputs the watchlist state as structured JSON to stdout.

use crate::application::watchlist_store::WatchlistStore;
use crate::infrastructure::observability::metrics::Metrics;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Metrics snapshot for JSON output
#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub watchlist: WatchlistSnapshot,
}

#[derive(Serialize)]
pub struct WatchlistSnapshot {
    pub size: usize,
    pub gainers: usize,
    pub losers: usize,
    pub instruments: Vec<InstrumentSnapshot>,
}

#[derive(Serialize)]
pub struct InstrumentSnapshot {
    pub symbol: String,
    pub currency: String,
    pub price: f64,
    pub change_percent: Option<f64>,
    pub updated_at: String,
}

/// Outputs metrics as structured JSON logs on a configurable interval.
pub struct MetricsReporter {
    store: WatchlistStore,
    metrics: Metrics,
    start_time: Instant,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(store: WatchlistStore, metrics: Metrics, interval_seconds: u64) -> Self {
        Self {
            store,
            metrics,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds),
        }
    }

    /// Run the reporter in a loop, outputting metrics periodically
    pub async fn run(self) {
        info!(
            "MetricsReporter: Starting push-based metrics (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            let snapshot = self.collect_snapshot().await;
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    // Prefixed so log shippers can filter it
                    println!("METRICS_JSON:{}", json);
                    info!(
                        "Watchlist: {} instruments ({} up, {} down) | Uptime: {}s",
                        snapshot.watchlist.size,
                        snapshot.watchlist.gainers,
                        snapshot.watchlist.losers,
                        snapshot.uptime_seconds
                    );
                }
                Err(e) => warn!("Failed to serialize metrics: {}", e),
            }
        }
    }

    async fn collect_snapshot(&self) -> MetricsSnapshot {
        let watchlist = self.store.snapshot().await;
        let uptime = self.start_time.elapsed().as_secs();

        let instruments: Vec<InstrumentSnapshot> = watchlist
            .instruments()
            .iter()
            .map(|i| InstrumentSnapshot {
                symbol: i.symbol.clone(),
                currency: i.currency().to_string(),
                price: i.price.to_f64().unwrap_or(0.0),
                change_percent: i.change_percent.and_then(|p| p.to_f64()),
                updated_at: i.updated_at.to_rfc3339(),
            })
            .collect();

        // Drop series for symbols that are no longer tracked
        self.metrics.instrument_price.reset();
        for instrument in &instruments {
            self.metrics.set_instrument_price(
                &instrument.symbol,
                &instrument.currency,
                instrument.price,
            );
        }
        self.metrics.watchlist_size.set(instruments.len() as f64);
        self.metrics.uptime_seconds.set(uptime as f64);

        let gainers = instruments
            .iter()
            .filter(|i| i.change_percent.is_some_and(|p| p > 0.0))
            .count();
        let losers = instruments
            .iter()
            .filter(|i| i.change_percent.is_some_and(|p| p < 0.0))
            .count();

        MetricsSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime,
            version: env!("CARGO_PKG_VERSION").to_string(),
            watchlist: WatchlistSnapshot {
                size: instruments.len(),
                gainers,
                losers,
                instruments,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::instrument::{Instrument, PriceUpdate};
    use crate::domain::market::symbol::Market;
    use crate::domain::watchlist::Watchlist;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn instrument(symbol: &str, market: Market, price: rust_decimal::Decimal) -> Instrument {
        let update = PriceUpdate {
            price,
            previous_close: dec!(100),
            day_high: price,
            day_low: price,
            volume: "10".to_string(),
            as_of: Utc::now(),
        };
        Instrument::new(symbol, market, &update)
    }

    #[tokio::test]
    async fn test_metrics_snapshot_collection() {
        let store = WatchlistStore::with_watchlist(Watchlist::from_instruments(vec![
            instrument("AAPL", Market::Foreign, dec!(110)),
            instrument("MSFT", Market::Foreign, dec!(90)),
            instrument("005930.KS", Market::Domestic, dec!(100)),
        ]));
        let metrics = Metrics::new().expect("Failed to create metrics");
        let reporter = MetricsReporter::new(store, metrics.clone(), 60);

        let snapshot = reporter.collect_snapshot().await;

        assert_eq!(snapshot.watchlist.size, 3);
        assert_eq!(snapshot.watchlist.gainers, 1);
        assert_eq!(snapshot.watchlist.losers, 1);
        assert_eq!(snapshot.watchlist.instruments[2].currency, "KRW");
        assert!(metrics.render().contains("tickwatch_watchlist_size 3"));
    }

    #[tokio::test]
    async fn test_removed_symbol_stops_exporting_price() {
        let store = WatchlistStore::with_watchlist(Watchlist::from_instruments(vec![
            instrument("AAPL", Market::Foreign, dec!(110)),
            instrument("MSFT", Market::Foreign, dec!(90)),
        ]));
        let metrics = Metrics::new().expect("Failed to create metrics");
        let reporter = MetricsReporter::new(store.clone(), metrics.clone(), 60);

        reporter.collect_snapshot().await;
        assert!(metrics.render().contains(r#"symbol="MSFT""#));

        store.remove("MSFT").await;
        reporter.collect_snapshot().await;
        let output = metrics.render();
        assert!(!output.contains(r#"symbol="MSFT""#));
        assert!(output.contains(r#"symbol="AAPL""#));
    }

    #[tokio::test]
    async fn test_snapshot_serialization() {
        let reporter = MetricsReporter::new(
            WatchlistStore::new(),
            Metrics::new().expect("Failed to create metrics"),
            60,
        );
        let json = serde_json::to_string(&reporter.collect_snapshot().await)
            .expect("Failed to serialize");
        assert!(json.contains(r#""size":0"#));
        assert!(json.contains("version"));
    }
}
