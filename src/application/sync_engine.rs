//! Watchlist refresh and persistence orchestration.
//!
//! A refresh fans out one quote request per tracked symbol, waits for all of
//! them to settle, then applies every success in a single merge followed by
//! a single full-replace save. One symbol failing never blocks the others,
//! and a refresh requested while another is in flight is dropped.

use crate::application::watchlist_store::WatchlistStore;
use crate::domain::errors::{EditError, MarketDataError, PersistenceError, SessionError};
use crate::domain::market::instrument::Instrument;
use crate::domain::market::symbol::normalize_symbol;
use crate::domain::ports::QuoteService;
use crate::domain::repositories::WatchlistRepository;
use crate::infrastructure::observability::Metrics;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, watch};
use tracing::{debug, info, warn};

/// Refresh lifecycle of one watchlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// Quote requests are in flight.
    Refreshing,
    /// Quotes settled with at least one failure; merging what succeeded.
    FailedPartial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Manual,
    Timer,
    Load,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub trigger: RefreshTrigger,
    pub requested: usize,
    pub updated: Vec<String>,
    pub failed: Vec<MarketDataError>,
    pub persisted: bool,
    /// Set when the merged list could not be saved. The in-memory copy keeps
    /// the new prices regardless.
    pub persistence_error: Option<PersistenceError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another refresh was already running; nothing was done.
    Skipped,
    /// The session has ended; nothing was done.
    Closed,
    Completed(RefreshReport),
}

/// Result of a user edit (add or remove).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub symbol: String,
    pub changed: bool,
    pub persistence_error: Option<PersistenceError>,
}

pub struct SyncEngine {
    user_id: String,
    store: WatchlistStore,
    quotes: Arc<dyn QuoteService>,
    repository: Arc<dyn WatchlistRepository>,
    state: watch::Sender<SyncState>,
    metrics: Option<Metrics>,
    /// `true` once the session has ended. Refreshes and edits hold a read
    /// guard for their whole run, so `close` waits for them.
    closed: RwLock<bool>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Returns the engine to `Idle` when a refresh ends, however it ends.
struct RefreshGuard<'a> {
    state: &'a watch::Sender<SyncState>,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.state.send_replace(SyncState::Idle);
    }
}

impl SyncEngine {
    pub fn new(
        user_id: impl Into<String>,
        store: WatchlistStore,
        quotes: Arc<dyn QuoteService>,
        repository: Arc<dyn WatchlistRepository>,
    ) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            user_id: user_id.into(),
            store,
            quotes,
            repository,
            state,
            metrics: None,
            closed: RwLock::new(false),
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn store(&self) -> &WatchlistStore {
        &self.store
    }

    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Load the user's stored watchlist into the store (empty if none).
    pub async fn load(&self) -> Result<usize, PersistenceError> {
        let loaded = self
            .repository
            .load(&self.user_id)
            .await
            .map_err(|e| PersistenceError::LoadFailed {
                user_id: self.user_id.clone(),
                reason: format!("{:#}", e),
            })?
            .unwrap_or_default();

        let count = loaded.len();
        self.store.replace(loaded).await;
        self.record_size(count);
        info!(
            "SyncEngine: Loaded {} instruments for user {}",
            count, self.user_id
        );
        Ok(count)
    }

    /// Stop accepting refreshes and edits, then wait until the ones in
    /// flight have finished. Nothing is written after this returns.
    pub async fn close(&self) {
        let mut closed = self.closed.write().await;
        if !*closed {
            *closed = true;
            info!("SyncEngine: Closed for user {}", self.user_id);
        }
    }

    pub async fn is_closed(&self) -> bool {
        *self.closed.read().await
    }

    /// Refresh every tracked instrument once.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> RefreshOutcome {
        let Some(_open) = self.open_guard().await else {
            debug!("SyncEngine: {:?} refresh ignored, session closed", trigger);
            return RefreshOutcome::Closed;
        };
        let Some(_guard) = self.begin_refresh() else {
            debug!(
                "SyncEngine: {:?} refresh ignored, a batch is already in flight",
                trigger
            );
            return RefreshOutcome::Skipped;
        };

        let symbols = self.store.symbols().await;
        let requested = symbols.len();
        debug!(
            "SyncEngine: {:?} refresh of {} symbols started",
            trigger, requested
        );

        let results = join_all(symbols.into_iter().map(|symbol| async move {
            let result = self.quotes.fetch_quote(&symbol).await;
            (symbol, result)
        }))
        .await;

        let mut updates = HashMap::new();
        let mut failed = Vec::new();
        for (symbol, result) in results {
            match result {
                Ok(snapshot) => {
                    updates.insert(symbol, snapshot.update);
                }
                Err(e) => {
                    warn!("SyncEngine: {}", e);
                    failed.push(e);
                }
            }
        }

        if !failed.is_empty() {
            self.state.send_replace(SyncState::FailedPartial);
        }

        let mut report = RefreshReport {
            trigger,
            requested,
            updated: Vec::new(),
            failed,
            persisted: false,
            persistence_error: None,
        };

        if let Some(metrics) = &self.metrics {
            metrics.inc_refreshes(trigger_label(trigger));
            metrics.inc_quote_failures(report.failed.len());
        }

        if updates.is_empty() {
            if requested > 0 {
                warn!("SyncEngine: No quotes succeeded, keeping last known prices");
            }
            return RefreshOutcome::Completed(report);
        }

        let applied = self.store.upsert_prices(&updates).await;
        if applied.is_empty() {
            debug!("SyncEngine: Quoted symbols are no longer tracked, nothing to save");
            return RefreshOutcome::Completed(report);
        }
        report.updated = applied;

        match self.persist().await {
            Ok(()) => report.persisted = true,
            Err(e) => report.persistence_error = Some(e),
        }

        info!(
            "SyncEngine: {:?} refresh done ({} updated, {} failed, persisted: {})",
            trigger,
            report.updated.len(),
            report.failed.len(),
            report.persisted
        );

        RefreshOutcome::Completed(report)
    }

    /// Fetch a fresh quote for `raw_symbol` and start tracking it.
    ///
    /// Already-tracked symbols are left as they are.
    pub async fn add_symbol(&self, raw_symbol: &str) -> Result<EditOutcome, EditError> {
        let _open = self.edit_guard().await?;
        let normalized = normalize_symbol(raw_symbol)
            .ok_or_else(|| MarketDataError::quote(raw_symbol, "empty symbol"))?;

        if self.store.get(&normalized.symbol).await.is_some() {
            return Ok(EditOutcome {
                symbol: normalized.symbol,
                changed: false,
                persistence_error: None,
            });
        }

        let snapshot = self.quotes.fetch_quote(&normalized.symbol).await?;
        let instrument: Instrument = snapshot.to_instrument();
        let symbol = instrument.symbol.clone();

        if !self.store.add(instrument).await {
            return Ok(EditOutcome {
                symbol,
                changed: false,
                persistence_error: None,
            });
        }

        info!("SyncEngine: Now tracking {}", symbol);
        let persistence_error = self.persist().await.err();
        Ok(EditOutcome {
            symbol,
            changed: true,
            persistence_error,
        })
    }

    /// Stop tracking a symbol. Removing an untracked symbol is a no-op.
    pub async fn remove_symbol(&self, raw_symbol: &str) -> Result<EditOutcome, EditError> {
        let _open = self.edit_guard().await?;
        let symbol = normalize_symbol(raw_symbol)
            .map(|n| n.symbol)
            .unwrap_or_default();

        if !self.store.remove(&symbol).await {
            return Ok(EditOutcome {
                symbol,
                changed: false,
                persistence_error: None,
            });
        }

        info!("SyncEngine: Stopped tracking {}", symbol);
        let persistence_error = self.persist().await.err();
        Ok(EditOutcome {
            symbol,
            changed: true,
            persistence_error,
        })
    }

    async fn open_guard(&self) -> Option<RwLockReadGuard<'_, bool>> {
        let guard = self.closed.read().await;
        if *guard { None } else { Some(guard) }
    }

    async fn edit_guard(&self) -> Result<RwLockReadGuard<'_, bool>, EditError> {
        self.open_guard()
            .await
            .ok_or(EditError::Session(SessionError::NotSignedIn))
    }

    fn begin_refresh(&self) -> Option<RefreshGuard<'_>> {
        let acquired = self.state.send_if_modified(|state| {
            if *state == SyncState::Idle {
                *state = SyncState::Refreshing;
                true
            } else {
                false
            }
        });
        acquired.then_some(RefreshGuard { state: &self.state })
    }

    async fn persist(&self) -> Result<(), PersistenceError> {
        let snapshot = self.store.snapshot().await;
        self.record_size(snapshot.len());

        self.repository
            .save(&self.user_id, &snapshot)
            .await
            .map_err(|e| {
                warn!(
                    "SyncEngine: Watchlist save failed for {}, changes are kept in memory only: {:#}",
                    self.user_id, e
                );
                if let Some(metrics) = &self.metrics {
                    metrics.inc_persistence_failures();
                }
                PersistenceError::WriteFailed {
                    user_id: self.user_id.clone(),
                    reason: format!("{:#}", e),
                }
            })
    }

    fn record_size(&self, size: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.watchlist_size.set(size as f64);
        }
    }
}

fn trigger_label(trigger: RefreshTrigger) -> &'static str {
    match trigger {
        RefreshTrigger::Manual => "manual",
        RefreshTrigger::Timer => "timer",
        RefreshTrigger::Load => "load",
    }
}
