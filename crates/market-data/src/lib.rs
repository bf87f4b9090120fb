//! Cryptofolio Market Data - cached access to a rate-limited price source.
//!
//! This crate provides the market-facing half of the portfolio core:
//! - [`provider::PriceProvider`]: trait over the external price source
//! - [`provider::CoinGeckoProvider`]: the default HTTP implementation
//! - [`cache::MarketDataCache`]: a TTL-windowed memoization layer
//! - [`resolver::AssetResolver`]: loose identifier to canonical asset mapping

pub mod cache;
pub mod constants;
pub mod errors;
pub mod models;
pub mod provider;
pub mod resolver;

pub use cache::MarketDataCache;
pub use errors::{MarketDataError, Result};
pub use models::{Asset, AssetDetail, MarketListing, PriceQuote, TopAssetsPage};
pub use provider::{CoinGeckoProvider, PriceProvider};
pub use resolver::AssetResolver;
