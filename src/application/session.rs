use crate::application::scheduler::RefreshScheduler;
use crate::application::sync_engine::{RefreshOutcome, RefreshTrigger, SyncEngine};
use crate::application::watchlist_store::WatchlistStore;
use crate::domain::errors::SessionError;
use crate::domain::ports::{IdentityProvider, QuoteService};
use crate::domain::repositories::WatchlistRepository;
use crate::infrastructure::observability::Metrics;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

struct ActiveSession {
    engine: Arc<SyncEngine>,
    scheduler: Option<RefreshScheduler>,
}

/// Gates watchlist access on identity and owns the session's refresh task.
///
/// Without a signed-in user there is no store, no engine and no timer.
pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    quotes: Arc<dyn QuoteService>,
    repository: Arc<dyn WatchlistRepository>,
    refresh_interval: Option<Duration>,
    metrics: Option<Metrics>,
    active: Mutex<Option<ActiveSession>>,
}

impl SessionManager {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        quotes: Arc<dyn QuoteService>,
        repository: Arc<dyn WatchlistRepository>,
    ) -> Self {
        Self {
            identity,
            quotes,
            repository,
            refresh_interval: None,
            metrics: None,
            active: Mutex::new(None),
        }
    }

    /// Enable the periodic refresh task for signed-in sessions.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Load the current user's watchlist, refresh it once and start the
    /// periodic task. Signing in again as the same user is a no-op.
    pub async fn sign_in(&self) -> Result<Arc<SyncEngine>> {
        let user_id = self
            .identity
            .current_user()
            .await
            .ok_or(SessionError::NotSignedIn)?;

        let mut active = self.active.lock().await;
        if let Some(session) = active.as_ref() {
            if session.engine.user_id() == user_id {
                return Ok(session.engine.clone());
            }
            return Err(SessionError::AlreadySignedIn {
                user_id: session.engine.user_id().to_string(),
            }
            .into());
        }

        let mut engine = SyncEngine::new(
            user_id.clone(),
            WatchlistStore::new(),
            self.quotes.clone(),
            self.repository.clone(),
        );
        if let Some(metrics) = &self.metrics {
            engine = engine.with_metrics(metrics.clone());
        }
        let engine = Arc::new(engine);

        engine.load().await?;

        if let RefreshOutcome::Completed(report) = engine.refresh(RefreshTrigger::Load).await
            && let Some(e) = report.persistence_error
        {
            warn!("SessionManager: {}", e);
        }

        let scheduler = self
            .refresh_interval
            .map(|period| RefreshScheduler::start(engine.clone(), period));

        info!("SessionManager: Signed in as {}", user_id);
        *active = Some(ActiveSession {
            engine: engine.clone(),
            scheduler,
        });

        Ok(engine)
    }

    /// Stop the refresh task, close the engine and drop the in-memory
    /// watchlist. Storage is left as it was.
    /// Returns false when nobody was signed in.
    pub async fn sign_out(&self) -> bool {
        let Some(session) = self.active.lock().await.take() else {
            return false;
        };

        if let Some(scheduler) = session.scheduler {
            scheduler.stop().await;
        }
        // Waits out any refresh or edit still running, so the clear below
        // can never be saved over the stored watchlist.
        session.engine.close().await;
        session.engine.store().clear().await;

        info!("SessionManager: Signed out {}", session.engine.user_id());
        true
    }

    pub async fn engine(&self) -> Result<Arc<SyncEngine>, SessionError> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|s| s.engine.clone())
            .ok_or(SessionError::NotSignedIn)
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    pub async fn is_refresh_task_running(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .and_then(|s| s.scheduler.as_ref())
            .is_some_and(|s| s.is_running())
    }
}

/// Whether a failed `sign_in` may succeed later. Session errors (no user,
/// another user active) are configuration problems; storage failures are not.
pub fn is_retryable_sign_in_error(err: &anyhow::Error) -> bool {
    err.downcast_ref::<SessionError>().is_none()
}
