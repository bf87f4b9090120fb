//! Price source providers.

mod coingecko;
mod traits;

pub use coingecko::CoinGeckoProvider;
pub use traits::PriceProvider;
