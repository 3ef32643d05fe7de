// In-memory watchlist shared within a session
pub mod watchlist_store;

// Refresh orchestration and persistence
pub mod sync_engine;

// Periodic refresh task
pub mod scheduler;

// Identity-gated session lifecycle
pub mod session;

// Rate caching and conversions
pub mod conversion_service;

// Composition root
pub mod system;
