pub mod analysis;
pub mod fallback;
pub mod providers;
pub mod proxy;
pub mod query_builder;
pub mod rate_limiter;
pub mod recommendations;
pub mod scoring;
pub mod watchlist;

pub use analysis::{ContentAnalyzer, OpenAiAnalyzer};
pub use providers::{tmdb::TmdbProvider, MetadataProvider};
pub use rate_limiter::{RateLimitRule, RateLimiter};
pub use watchlist::WatchlistStore;
