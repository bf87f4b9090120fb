//! Time-windowed cache shielding the rate-limited price source.
//!
//! Every external read goes through [`MarketDataCache::top_assets`] or
//! [`MarketDataCache::asset_detail`]. Responses are memoized per request
//! signature for a fixed TTL. There is deliberately no single-flight
//! deduplication: two tasks racing on the same cold key may both hit the
//! provider, and both writes converge on the same idempotent payload.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::{debug, warn};

use crate::constants::{CACHE_TTL_SECONDS, DEFAULT_VS_CURRENCY, TOP_ASSETS_COUNT};
use crate::errors::{MarketDataError, Result};
use crate::models::{AssetDetail, TopAssetsPage};
use crate::provider::PriceProvider;

/// Canonical request signature: endpoint plus the parameters that shape it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RequestKey {
    TopAssets { count: usize, vs_currency: String },
    AssetDetail { id: String, vs_currency: String },
}

#[derive(Clone)]
enum Payload {
    TopAssets(Arc<TopAssetsPage>),
    Detail(Arc<AssetDetail>),
}

struct CacheEntry {
    payload: Payload,
    fetched_at: DateTime<Utc>,
}

/// TTL-windowed memoization layer over a [`PriceProvider`].
///
/// Constructed once at process start and shared behind an [`Arc`]. State is
/// fully re-derivable, so teardown is simply process exit.
pub struct MarketDataCache {
    provider: Arc<dyn PriceProvider>,
    entries: DashMap<RequestKey, CacheEntry>,
    ttl: Duration,
    vs_currency: String,
}

impl MarketDataCache {
    /// Create a cache with the default 60-second TTL and quote currency.
    pub fn new(provider: Arc<dyn PriceProvider>) -> Self {
        Self::with_ttl(provider, Duration::seconds(CACHE_TTL_SECONDS))
    }

    /// Create a cache with a custom TTL. Used by tests; production code
    /// should go through [`new`](Self::new).
    pub fn with_ttl(provider: Arc<dyn PriceProvider>, ttl: Duration) -> Self {
        Self {
            provider,
            entries: DashMap::new(),
            ttl,
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
        }
    }

    /// The quote currency all cached prices are expressed in.
    pub fn vs_currency(&self) -> &str {
        &self.vs_currency
    }

    /// The ranked top-N listing, from cache when fresh.
    pub async fn top_assets(&self) -> Result<Arc<TopAssetsPage>> {
        let key = RequestKey::TopAssets {
            count: TOP_ASSETS_COUNT,
            vs_currency: self.vs_currency.clone(),
        };

        if let Some(Payload::TopAssets(page)) = self.fresh_payload(&key) {
            return Ok(page);
        }

        let listings = self
            .provider
            .top_assets(TOP_ASSETS_COUNT, &self.vs_currency)
            .await
            .map_err(|e| self.on_provider_failure(&key, e))?;

        let fetched_at = Utc::now();
        let page = Arc::new(TopAssetsPage {
            listings,
            fetched_at,
        });
        self.store(key, Payload::TopAssets(page.clone()), fetched_at);
        Ok(page)
    }

    /// The full detail record for one asset id, from cache when fresh.
    pub async fn asset_detail(&self, asset_id: &str) -> Result<Arc<AssetDetail>> {
        let key = RequestKey::AssetDetail {
            id: asset_id.to_string(),
            vs_currency: self.vs_currency.clone(),
        };

        if let Some(Payload::Detail(detail)) = self.fresh_payload(&key) {
            return Ok(detail);
        }

        let detail = self
            .provider
            .asset_detail(asset_id, &self.vs_currency)
            .await
            .map_err(|e| self.on_provider_failure(&key, e))?;

        let detail = Arc::new(detail);
        self.store(key, Payload::Detail(detail.clone()), Utc::now());
        Ok(detail)
    }

    /// Returns the payload for `key` iff the entry exists and is still within
    /// the TTL window.
    fn fresh_payload(&self, key: &RequestKey) -> Option<Payload> {
        let entry = self.entries.get(key)?;
        if Utc::now().signed_duration_since(entry.fetched_at) < self.ttl {
            debug!("cache hit for {:?}", key);
            Some(entry.payload.clone())
        } else {
            debug!("cache entry stale for {:?}", key);
            None
        }
    }

    /// Replaces the entry for `key` wholesale. A stale entry is never
    /// patched in place; the full payload and timestamp land together.
    fn store(&self, key: RequestKey, payload: Payload, fetched_at: DateTime<Utc>) {
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                fetched_at,
            },
        );
    }

    /// On provider failure the existing entry (stale or not) is left
    /// untouched so a later retry can still compare against it.
    fn on_provider_failure(&self, key: &RequestKey, err: MarketDataError) -> MarketDataError {
        warn!(
            "provider {} failed for {:?}: {}",
            self.provider.id(),
            key,
            err
        );
        err
    }
}
