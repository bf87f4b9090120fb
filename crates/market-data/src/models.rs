//! Market data domain models.
//!
//! Everything here is transient: identities and quotes are re-fetched from the
//! price source on every resolution and never persisted beyond the cache TTL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical identity for a tradable coin.
///
/// `id` is the price source's stable lowercase slug (e.g. "bitcoin");
/// `symbol` is the short ticker (e.g. "btc"), unique within the resolvable
/// ranked window but not across the full asset universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// One row of the ranked-by-market-cap listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketListing {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Decimal,
    pub market_cap: Option<Decimal>,
    pub market_cap_rank: Option<u32>,
    pub high_24h: Option<Decimal>,
    pub low_24h: Option<Decimal>,
    pub percent_change_24h: Option<Decimal>,
    pub percent_change_7d: Option<Decimal>,
    pub percent_change_30d: Option<Decimal>,
}

impl MarketListing {
    /// The canonical asset identity carried by this row.
    pub fn asset(&self) -> Asset {
        Asset {
            id: self.id.clone(),
            symbol: self.symbol.clone(),
            name: self.name.clone(),
        }
    }

    /// Builds a point-in-time quote from this row, stamped with the time the
    /// containing page was fetched.
    pub fn to_quote(&self, as_of: DateTime<Utc>) -> PriceQuote {
        PriceQuote {
            asset_id: self.id.clone(),
            current_price: self.current_price,
            percent_change_24h: self.percent_change_24h,
            percent_change_7d: self.percent_change_7d,
            percent_change_30d: self.percent_change_30d,
            market_cap: self.market_cap,
            rank: self.market_cap_rank,
            high_24h: self.high_24h,
            low_24h: self.low_24h,
            as_of,
        }
    }
}

/// A point-in-time price read for one asset. Never persisted; recomputed on
/// every valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub asset_id: String,
    /// Price in quote-currency units. Positive.
    pub current_price: Decimal,
    /// Signed percentage points over the trailing window.
    pub percent_change_24h: Option<Decimal>,
    pub percent_change_7d: Option<Decimal>,
    pub percent_change_30d: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub rank: Option<u32>,
    pub high_24h: Option<Decimal>,
    pub low_24h: Option<Decimal>,
    /// When the underlying payload was fetched from the price source.
    pub as_of: DateTime<Utc>,
}

/// Full detail record for one asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDetail {
    pub asset: Asset,
    /// Free-text description from the price source, when present.
    pub description: Option<String>,
    pub quote: PriceQuote,
}

/// The ranked listing page as handed out by the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopAssetsPage {
    pub listings: Vec<MarketListing>,
    pub fetched_at: DateTime<Utc>,
}

impl TopAssetsPage {
    /// Looks up a listing by exact asset id.
    pub fn find_by_id(&self, asset_id: &str) -> Option<&MarketListing> {
        self.listings.iter().find(|l| l.id == asset_id)
    }
}
