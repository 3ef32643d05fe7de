pub mod database;
pub mod watchlist_repository;

pub use database::Database;
pub use watchlist_repository::SqliteWatchlistRepository;
