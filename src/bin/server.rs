//! tickwatch Server - headless watchlist sync
//!
//! Signs in as `WATCHLIST_USER_ID`, refreshes the watchlist on the
//! configured interval and pushes metrics as JSON lines to stdout.
//!
//! # Usage
//! ```sh
//! WATCHLIST_USER_ID=me REFRESH_INTERVAL_SECS=300 cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `OBSERVABILITY_ENABLED` - Enable metrics reporting (default: true)
//! - `OBSERVABILITY_INTERVAL` - Interval in seconds between metric outputs (default: 60)

use anyhow::Result;
use std::time::Duration;
use tickwatch::application::session::is_retryable_sign_in_error;
use tickwatch::application::system::Application;
use tickwatch::config::Config;
use tickwatch::infrastructure::observability::MetricsReporter;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

const SIGN_IN_RETRY: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("tickwatch Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Mode={:?}, Base={}, Refresh={:?}",
        config.mode,
        config.sync.base_currency,
        config.refresh_interval()
    );

    let app = Application::build(config.clone(), true).await?;

    // Storage may come up after us; keep trying until Ctrl+C.
    let engine = loop {
        match app.session.sign_in().await {
            Ok(engine) => break engine,
            Err(e) if !is_retryable_sign_in_error(&e) => {
                return Err(e.context("Sign in cannot succeed, check WATCHLIST_USER_ID"));
            }
            Err(e) => {
                warn!("Sign in failed: {:#}. Retrying in {:?}", e, SIGN_IN_RETRY);
                tokio::select! {
                    _ = tokio::time::sleep(SIGN_IN_RETRY) => {}
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown signal received before sign in. Exiting...");
                        return Ok(());
                    }
                }
            }
        }
    };
    info!(
        "Tracking {} symbols for {}",
        engine.store().len().await,
        engine.user_id()
    );

    if config.observability.enabled {
        let interval = config.observability.interval_secs;
        let reporter = MetricsReporter::new(engine.store().clone(), app.metrics.clone(), interval);

        tokio::spawn(async move {
            reporter.run().await;
        });

        info!("Metrics reporter started (interval: {}s)", interval);
    } else {
        info!("Metrics reporting disabled.");
    }

    info!("Server running. Press Ctrl+C to shutdown.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Signing out...");
    app.session.sign_out().await;

    Ok(())
}
