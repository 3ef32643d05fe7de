//! In-memory watchlist storage.
//!
//! Used by mock mode and by tests. Data is lost on restart. A failure switch
//! lets tests exercise the write-failure path without a real database.

use crate::domain::repositories::WatchlistRepository;
use crate::domain::watchlist::Watchlist;
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct InMemoryWatchlistRepository {
    rows: Arc<RwLock<HashMap<String, Watchlist>>>,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl InMemoryWatchlistRepository {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
            fail_reads: Arc::new(AtomicBool::new(false)),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Seed a stored row without counting it as a save.
    pub async fn seed(&self, user_id: &str, watchlist: Watchlist) {
        self.rows.write().await.insert(user_id.to_string(), watchlist);
    }

    pub async fn stored(&self, user_id: &str) -> Option<Watchlist> {
        self.rows.read().await.get(user_id).cloned()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryWatchlistRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WatchlistRepository for InMemoryWatchlistRepository {
    async fn load(&self, user_id: &str) -> Result<Option<Watchlist>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("storage unavailable");
        }
        Ok(self.rows.read().await.get(user_id).cloned())
    }

    async fn save(&self, user_id: &str, watchlist: &Watchlist) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("storage unavailable");
        }
        self.rows
            .write()
            .await
            .insert(user_id.to_string(), watchlist.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
