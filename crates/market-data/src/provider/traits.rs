//! Price provider trait definition.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{AssetDetail, MarketListing};

/// Trait over the external price source.
///
/// Implementations cover the two query shapes the core needs: the ranked
/// listing by market cap and the full detail record for one asset id.
/// Implementations must be bounded by a timeout and map every failure mode
/// to [`MarketDataError::DataSourceUnavailable`] rather than hanging or
/// panicking.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs.
    fn id(&self) -> &'static str;

    /// Fetch the top `count` assets ranked by market cap, priced in
    /// `vs_currency`. Rows are ordered rank-ascending.
    async fn top_assets(
        &self,
        count: usize,
        vs_currency: &str,
    ) -> Result<Vec<MarketListing>, MarketDataError>;

    /// Fetch the full detail record for one asset id, priced in
    /// `vs_currency`.
    async fn asset_detail(
        &self,
        asset_id: &str,
        vs_currency: &str,
    ) -> Result<AssetDetail, MarketDataError>;
}
