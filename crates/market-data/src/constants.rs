//! Shared constants for the market data crate.

/// Time-to-live for cached price source responses, in seconds.
/// Applied uniformly to all request keys; no per-key override.
pub const CACHE_TTL_SECONDS: i64 = 60;

/// Size of the ranked-by-market-cap window the resolver searches.
/// Identifiers outside the top N are deliberately unresolvable.
pub const TOP_ASSETS_COUNT: usize = 100;

/// Default quote currency for all price requests.
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// Timeout applied to every external HTTP call, in seconds.
pub const REQUEST_TIMEOUT_SECONDS: u64 = 5;
