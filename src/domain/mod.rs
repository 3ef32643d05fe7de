// Instruments, symbols, rates and conversion
pub mod market;

// Tracked instrument list
pub mod watchlist;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;

// Domain-specific error types
pub mod errors;
