use std::sync::Arc;
use tickwatch::application::sync_engine::{RefreshOutcome, RefreshTrigger, SyncEngine};
use tickwatch::application::watchlist_store::WatchlistStore;
use tickwatch::domain::repositories::WatchlistRepository;
use tickwatch::infrastructure::mock::MockQuoteService;
use tickwatch::infrastructure::persistence::{Database, SqliteWatchlistRepository};

fn engine_for(user: &str, repo: Arc<dyn WatchlistRepository>) -> SyncEngine {
    SyncEngine::new(user, WatchlistStore::new(), Arc::new(MockQuoteService::new()), repo)
}

#[tokio::test]
async fn test_watchlist_survives_a_new_session() {
    let db = Database::new("sqlite::memory:").await.unwrap();
    let repo: Arc<dyn WatchlistRepository> = Arc::new(SqliteWatchlistRepository::new(db));

    let first = engine_for("user-1", repo.clone());
    first.load().await.unwrap();
    for symbol in ["nvda", "000660", "035720.kq"] {
        first.add_symbol(symbol).await.unwrap();
    }
    first.remove_symbol("NVDA").await.unwrap();

    let second = engine_for("user-1", repo.clone());
    assert_eq!(second.load().await.unwrap(), 2);
    assert_eq!(
        second.store().symbols().await,
        vec!["000660.KS", "035720.KQ"]
    );
    assert_eq!(
        second.store().snapshot().await,
        first.store().snapshot().await
    );

    let other = engine_for("user-2", repo);
    assert_eq!(other.load().await.unwrap(), 0);
}

#[tokio::test]
async fn test_file_database_is_created_and_reopened() {
    let dir = std::env::temp_dir().join(format!("tickwatch-test-{}", std::process::id()));
    let url = format!("sqlite://{}/watchlists.db", dir.display());

    {
        let db = Database::new(&url).await.unwrap();
        let engine = engine_for("user-1", Arc::new(SqliteWatchlistRepository::new(db)));
        engine.load().await.unwrap();
        engine.add_symbol("MSFT").await.unwrap();
        let outcome = engine.refresh(RefreshTrigger::Manual).await;
        assert!(matches!(outcome, RefreshOutcome::Completed(ref r) if r.persisted));
    }

    let db = Database::new(&url).await.unwrap();
    let engine = engine_for("user-1", Arc::new(SqliteWatchlistRepository::new(db)));
    assert_eq!(engine.load().await.unwrap(), 1);
    assert!(engine.store().get("MSFT").await.is_some());

    let _ = std::fs::remove_dir_all(&dir);
}
