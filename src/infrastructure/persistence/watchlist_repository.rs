use crate::domain::repositories::WatchlistRepository;
use crate::domain::watchlist::Watchlist;
use crate::infrastructure::persistence::database::Database;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;

pub struct SqliteWatchlistRepository {
    database: Database,
}

impl SqliteWatchlistRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl WatchlistRepository for SqliteWatchlistRepository {
    async fn load(&self, user_id: &str) -> Result<Option<Watchlist>> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT stocks
            FROM watchlists
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.database.pool)
        .await
        .context("Failed to load watchlist")?;

        match row {
            Some((stocks,)) => {
                let watchlist: Watchlist = serde_json::from_str(&stocks)
                    .with_context(|| format!("Corrupt watchlist row for {}", user_id))?;
                Ok(Some(watchlist))
            }
            None => Ok(None),
        }
    }

    /// Replace the user's stored watchlist (upsert)
    async fn save(&self, user_id: &str, watchlist: &Watchlist) -> Result<()> {
        let stocks = serde_json::to_string(watchlist).context("Failed to encode watchlist")?;

        sqlx::query(
            r#"
            INSERT INTO watchlists (user_id, stocks, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(user_id) DO UPDATE SET
                stocks = excluded.stocks,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(stocks)
        .bind(Utc::now().timestamp())
        .execute(&self.database.pool)
        .await
        .context("Failed to save watchlist")?;

        Ok(())
    }
}
