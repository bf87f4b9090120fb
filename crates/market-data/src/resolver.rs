//! Asset resolution: loose user identifiers to canonical assets.
//!
//! Resolution is exact-match only, against the live ranked listing the cache
//! returns. The resolvable universe is therefore always the price source's
//! current top N by market cap and never drifts from it.

use std::sync::Arc;

use log::debug;

use crate::cache::MarketDataCache;
use crate::errors::{MarketDataError, Result};
use crate::models::{Asset, AssetDetail, PriceQuote};

/// Maps a user-supplied identifier (id or symbol, any casing, surrounding
/// whitespace tolerated) to a canonical [`Asset`].
pub struct AssetResolver {
    cache: Arc<MarketDataCache>,
}

impl AssetResolver {
    pub fn new(cache: Arc<MarketDataCache>) -> Self {
        Self { cache }
    }

    /// Resolve an identifier to a canonical asset.
    ///
    /// Matches `identifier == listing.id` or `identifier ==
    /// lowercase(listing.symbol)` within the ranked window; first exact match
    /// wins. No fuzzy or partial matching, no full-universe fallback.
    /// Deterministic within one TTL window of the cache.
    pub async fn resolve(&self, identifier: &str) -> Result<Asset> {
        let normalized = identifier.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(MarketDataError::AssetNotFound(identifier.to_string()));
        }

        let page = self.cache.top_assets().await?;
        let matched = page
            .listings
            .iter()
            .find(|l| l.id == normalized || l.symbol.to_lowercase() == normalized);

        match matched {
            Some(listing) => Ok(listing.asset()),
            None => {
                debug!("identifier {:?} not in ranked window", normalized);
                Err(MarketDataError::AssetNotFound(identifier.trim().to_string()))
            }
        }
    }

    /// A live quote for an already-resolved asset id.
    ///
    /// Served from the ranked listing when the asset appears there (stamped
    /// with the page fetch time); otherwise falls back to the detail
    /// endpoint.
    pub async fn quote(&self, asset_id: &str) -> Result<PriceQuote> {
        let page = self.cache.top_assets().await?;
        if let Some(listing) = page.find_by_id(asset_id) {
            return Ok(listing.to_quote(page.fetched_at));
        }

        let detail = self.cache.asset_detail(asset_id).await?;
        Ok(detail.quote.clone())
    }

    /// Resolve an identifier and fetch its full detail record.
    pub async fn detail(&self, identifier: &str) -> Result<Arc<AssetDetail>> {
        let asset = self.resolve(identifier).await?;
        self.cache.asset_detail(&asset.id).await
    }
}
