pub mod core;
pub mod exchange_rate;
pub mod identity;
pub mod mock;
pub mod observability;
pub mod persistence;
pub mod repositories;
pub mod yahoo;

pub use exchange_rate::ExchangeRateApiService;
pub use identity::StaticIdentityProvider;
pub use mock::{MockQuoteService, MockRateService};
pub use repositories::InMemoryWatchlistRepository;
pub use yahoo::YahooQuoteService;
