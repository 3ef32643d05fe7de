//! Prometheus metrics definitions for tickwatch
//!
//! All metrics use the `tickwatch_` prefix.

use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGauge, GenericGaugeVec},
};
use std::sync::Arc;

/// Prometheus metrics for the sync engine
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Refresh batches that ran to completion, by trigger
    pub refreshes_total: CounterVec,
    /// Individual quote lookups that failed during a refresh
    pub quote_failures_total: Counter,
    /// Watchlist writes that did not reach storage
    pub persistence_failures_total: Counter,
    /// Instruments currently on the watchlist
    pub watchlist_size: GenericGauge<AtomicF64>,
    /// Last known price per symbol, in the instrument's own currency
    pub instrument_price: GenericGaugeVec<AtomicF64>,
    /// Uptime in seconds
    pub uptime_seconds: GenericGauge<AtomicF64>,
}

impl Metrics {
    /// Create a new Metrics instance with all gauges and counters registered
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let refreshes_total = CounterVec::new(
            Opts::new("tickwatch_refreshes_total", "Completed refresh batches by trigger"),
            &["trigger"],
        )?;
        registry.register(Box::new(refreshes_total.clone()))?;

        let quote_failures_total = Counter::with_opts(Opts::new(
            "tickwatch_quote_failures_total",
            "Quote lookups that failed during a refresh",
        ))?;
        registry.register(Box::new(quote_failures_total.clone()))?;

        let persistence_failures_total = Counter::with_opts(Opts::new(
            "tickwatch_persistence_failures_total",
            "Watchlist writes that failed",
        ))?;
        registry.register(Box::new(persistence_failures_total.clone()))?;

        let watchlist_size = Gauge::with_opts(Opts::new(
            "tickwatch_watchlist_size",
            "Number of instruments on the watchlist",
        ))?;
        registry.register(Box::new(watchlist_size.clone()))?;

        let instrument_price = GaugeVec::new(
            Opts::new("tickwatch_instrument_price", "Last known price per symbol"),
            &["symbol", "currency"],
        )?;
        registry.register(Box::new(instrument_price.clone()))?;

        let uptime_seconds = Gauge::with_opts(Opts::new(
            "tickwatch_uptime_seconds",
            "Process uptime in seconds",
        ))?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            refreshes_total,
            quote_failures_total,
            persistence_failures_total,
            watchlist_size,
            instrument_price,
            uptime_seconds,
        })
    }

    /// Render all metrics in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn inc_refreshes(&self, trigger: &str) {
        self.refreshes_total.with_label_values(&[trigger]).inc();
    }

    pub fn inc_quote_failures(&self, count: usize) {
        if count > 0 {
            self.quote_failures_total.inc_by(count as f64);
        }
    }

    pub fn inc_persistence_failures(&self) {
        self.persistence_failures_total.inc();
    }

    /// Update the price gauge for a single symbol
    pub fn set_instrument_price(&self, symbol: &str, currency: &str, price: f64) {
        self.instrument_price
            .with_label_values(&[symbol, currency])
            .set(price);
    }
}
