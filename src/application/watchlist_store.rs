use crate::domain::market::instrument::{Instrument, PriceUpdate};
use crate::domain::watchlist::Watchlist;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session-scoped, shared in-memory watchlist.
///
/// Every mutation takes the write lock for its whole duration, so readers
/// never observe a half-applied refresh.
#[derive(Clone, Default)]
pub struct WatchlistStore {
    inner: Arc<RwLock<Watchlist>>,
}

impl WatchlistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watchlist(watchlist: Watchlist) -> Self {
        Self {
            inner: Arc::new(RwLock::new(watchlist)),
        }
    }

    /// Install a freshly loaded watchlist.
    pub async fn replace(&self, watchlist: Watchlist) {
        *self.inner.write().await = watchlist;
    }

    pub async fn snapshot(&self) -> Watchlist {
        self.inner.read().await.clone()
    }

    pub async fn add(&self, instrument: Instrument) -> bool {
        self.inner.write().await.add(instrument)
    }

    pub async fn remove(&self, symbol: &str) -> bool {
        self.inner.write().await.remove(symbol)
    }

    pub async fn upsert_prices(&self, updates: &HashMap<String, PriceUpdate>) -> Vec<String> {
        self.inner.write().await.upsert_prices(updates)
    }

    pub async fn get(&self, symbol: &str) -> Option<Instrument> {
        self.inner.read().await.get(symbol).cloned()
    }

    pub async fn symbols(&self) -> Vec<String> {
        self.inner.read().await.symbols()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drop the in-memory copy (sign-out). Storage is untouched.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}
