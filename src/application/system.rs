use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::application::conversion_service::ConversionService;
use crate::application::session::SessionManager;
use crate::config::{Config, Mode};
use crate::domain::ports::{QuoteService, RateService};
use crate::domain::repositories::WatchlistRepository;
use crate::infrastructure::exchange_rate::ExchangeRateApiService;
use crate::infrastructure::identity::StaticIdentityProvider;
use crate::infrastructure::mock::{MockQuoteService, MockRateService};
use crate::infrastructure::observability::Metrics;
use crate::infrastructure::persistence::{Database, SqliteWatchlistRepository};
use crate::infrastructure::yahoo::YahooQuoteService;

/// Wired services for one process.
pub struct Application {
    pub config: Config,
    pub identity: Arc<StaticIdentityProvider>,
    pub session: Arc<SessionManager>,
    pub conversion: Arc<ConversionService>,
    pub metrics: Metrics,
}

impl Application {
    /// Build adapters for `config.mode`, open storage and assemble the
    /// session. `with_timer` controls whether signed-in sessions get the
    /// periodic refresh task.
    pub async fn build(config: Config, with_timer: bool) -> Result<Self> {
        info!("Building tickwatch (Mode: {:?})...", config.mode);

        let (quotes, rates): (Arc<dyn QuoteService>, Arc<dyn RateService>) = match config.mode {
            Mode::Mock => {
                info!("Using Mock services");
                (
                    Arc::new(MockQuoteService::new()),
                    Arc::new(MockRateService),
                )
            }
            Mode::Live => {
                info!(
                    "Using live services (quotes: {}, rates: {})",
                    config.provider.quote_base_url, config.provider.rate_base_url
                );
                (
                    Arc::new(YahooQuoteService::new(
                        config.provider.quote_base_url.clone(),
                        config.http_timeout(),
                        config.provider.quote_max_retries,
                    )),
                    Arc::new(ExchangeRateApiService::new(
                        config.provider.rate_base_url.clone(),
                        config.provider.exchange_api_key.clone(),
                        config.http_timeout(),
                    )),
                )
            }
        };

        info!("Initializing Database at {}", config.sync.database_url);
        let db = Database::new(&config.sync.database_url)
            .await
            .context("Failed to initialize database")?;
        let repository: Arc<dyn WatchlistRepository> = Arc::new(SqliteWatchlistRepository::new(db));

        let metrics = Metrics::new()?;
        let identity = Arc::new(StaticIdentityProvider::new(config.sync.user_id.clone()));

        let mut session = SessionManager::new(identity.clone(), quotes, repository)
            .with_metrics(metrics.clone());
        if with_timer && let Some(period) = config.refresh_interval() {
            session = session.with_refresh_interval(period);
        }

        let conversion = ConversionService::new(
            rates,
            config.sync.base_currency.clone(),
            config.rate_cache_ttl(),
        );

        Ok(Self {
            config,
            identity,
            session: Arc::new(session),
            conversion: Arc::new(conversion),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ObservabilityEnvConfig, ProviderEnvConfig, SyncEnvConfig};

    fn mock_config(user: Option<&str>) -> Config {
        Config {
            mode: Mode::Mock,
            provider: ProviderEnvConfig::default(),
            sync: SyncEnvConfig {
                refresh_interval_secs: 300,
                database_url: "sqlite::memory:".to_string(),
                user_id: user.map(str::to_string),
                base_currency: "USD".to_string(),
                rate_cache_secs: 600,
            },
            observability: ObservabilityEnvConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_build_mock_application_and_sign_in() {
        let app = Application::build(mock_config(Some("user-1")), true)
            .await
            .expect("mock application");

        let engine = app.session.sign_in().await.unwrap();
        assert_eq!(engine.user_id(), "user-1");
        assert!(app.session.is_refresh_task_running().await);

        engine.add_symbol("aapl").await.unwrap();
        assert_eq!(engine.store().symbols().await, vec!["AAPL"]);

        assert!(app.session.sign_out().await);
    }

    #[tokio::test]
    async fn test_without_timer_no_task_is_started() {
        let app = Application::build(mock_config(Some("user-1")), false)
            .await
            .unwrap();
        app.session.sign_in().await.unwrap();
        assert!(!app.session.is_refresh_task_running().await);
        app.session.sign_out().await;
    }

    #[tokio::test]
    async fn test_without_identity_sign_in_fails() {
        let app = Application::build(mock_config(None), true).await.unwrap();
        assert!(app.session.sign_in().await.is_err());
    }
}
