//! Persistence gateway abstraction for watchlists.
//!
//! One stored watchlist per user. `save` is a full replace, so concurrent
//! sessions for the same user race and the later write wins.

use crate::domain::watchlist::Watchlist;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait WatchlistRepository: Send + Sync {
    /// `None` when the user has never saved a watchlist.
    async fn load(&self, user_id: &str) -> Result<Option<Watchlist>>;

    async fn save(&self, user_id: &str, watchlist: &Watchlist) -> Result<()>;
}
