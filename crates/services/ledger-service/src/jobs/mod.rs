//! Background jobs.

mod cache_refresh;

pub use cache_refresh::CacheRefreshJob;
