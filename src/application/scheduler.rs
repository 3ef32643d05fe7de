use crate::application::sync_engine::{RefreshOutcome, RefreshTrigger, SyncEngine};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periodic refresh task bound to one signed-in session.
///
/// Ticks are skipped while the watchlist is empty. Stopping (or dropping the
/// scheduler) never interrupts a batch that is already running; the task
/// exits before its next tick.
pub struct RefreshScheduler {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
    period: Duration,
}

impl RefreshScheduler {
    pub fn start(engine: Arc<SyncEngine>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(
                "RefreshScheduler: Started for user {} (every {:?})",
                engine.user_id(),
                period
            );

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        if engine.store().is_empty().await {
                            debug!("RefreshScheduler: Watchlist empty, skipping tick");
                            continue;
                        }
                        if let RefreshOutcome::Completed(report) = engine.refresh(RefreshTrigger::Timer).await
                            && let Some(e) = report.persistence_error
                        {
                            warn!("RefreshScheduler: {}", e);
                        }
                    }
                }
            }

            info!("RefreshScheduler: Stopped for user {}", engine.user_id());
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            handle,
            period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal the task and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.handle).await {
            warn!("RefreshScheduler: Task ended abnormally: {}", e);
        }
    }
}
