//! CoinGecko price provider implementation.
//!
//! Two endpoints are used:
//! - `/coins/markets` for the ranked listing by market cap
//! - `/coins/{id}` for the full detail record of one asset
//!
//! The free tier is rate limited, which is why all access goes through the
//! [`MarketDataCache`](crate::cache::MarketDataCache) rather than this
//! provider directly. API documentation: https://docs.coingecko.com/reference

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::constants::REQUEST_TIMEOUT_SECONDS;
use crate::errors::MarketDataError;
use crate::models::{Asset, AssetDetail, MarketListing};
use crate::provider::PriceProvider;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "COINGECKO";

// ============================================================================
// API Response Structures
// ============================================================================

/// One row of the /coins/markets response.
#[derive(Debug, Deserialize)]
struct MarketsRow {
    id: String,
    symbol: String,
    name: String,
    current_price: Option<Decimal>,
    market_cap: Option<Decimal>,
    market_cap_rank: Option<u32>,
    high_24h: Option<Decimal>,
    low_24h: Option<Decimal>,
    price_change_percentage_24h: Option<Decimal>,
    #[serde(rename = "price_change_percentage_7d_in_currency")]
    price_change_percentage_7d: Option<Decimal>,
    #[serde(rename = "price_change_percentage_30d_in_currency")]
    price_change_percentage_30d: Option<Decimal>,
}

/// Response from /coins/{id}.
#[derive(Debug, Deserialize)]
struct CoinDetailResponse {
    id: String,
    symbol: String,
    name: String,
    /// Localized descriptions keyed by language code.
    #[serde(default)]
    description: HashMap<String, String>,
    market_cap_rank: Option<u32>,
    market_data: Option<CoinMarketData>,
}

/// The market_data block of /coins/{id}.
#[derive(Debug, Deserialize)]
struct CoinMarketData {
    #[serde(default)]
    current_price: HashMap<String, Decimal>,
    #[serde(default)]
    market_cap: HashMap<String, Decimal>,
    #[serde(default)]
    high_24h: HashMap<String, Decimal>,
    #[serde(default)]
    low_24h: HashMap<String, Decimal>,
    price_change_percentage_24h: Option<Decimal>,
    price_change_percentage_7d: Option<Decimal>,
    price_change_percentage_30d: Option<Decimal>,
}

// ============================================================================
// CoinGeckoProvider
// ============================================================================

/// CoinGecko market data provider.
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
}

impl CoinGeckoProvider {
    /// Create a provider against the public CoinGecko API.
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL.to_string())
    }

    /// Create a provider against a custom base URL (self-hosted proxy or a
    /// test server).
    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, base_url }
    }

    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Response, MarketDataError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("CoinGecko request: {} with {} params", endpoint, params.len());

        let response = self.client.get(&url).query(params).send().await?;
        Ok(response)
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn top_assets(
        &self,
        count: usize,
        vs_currency: &str,
    ) -> Result<Vec<MarketListing>, MarketDataError> {
        let per_page = count.to_string();
        let response = self
            .get(
                "/coins/markets",
                &[
                    ("vs_currency", vs_currency),
                    ("order", "market_cap_desc"),
                    ("per_page", per_page.as_str()),
                    ("page", "1"),
                    ("price_change_percentage", "24h,7d,30d"),
                ],
            )
            .await?;

        if !response.status().is_success() {
            return Err(MarketDataError::DataSourceUnavailable(format!(
                "markets listing returned status {}",
                response.status()
            )));
        }

        let rows: Vec<MarketsRow> = response.json().await?;

        // Rows with no price are unusable for both resolution and valuation.
        let listings = rows
            .into_iter()
            .filter_map(|row| {
                let current_price = row.current_price?;
                Some(MarketListing {
                    id: row.id,
                    symbol: row.symbol,
                    name: row.name,
                    current_price,
                    market_cap: row.market_cap,
                    market_cap_rank: row.market_cap_rank,
                    high_24h: row.high_24h,
                    low_24h: row.low_24h,
                    percent_change_24h: row.price_change_percentage_24h,
                    percent_change_7d: row.price_change_percentage_7d,
                    percent_change_30d: row.price_change_percentage_30d,
                })
            })
            .collect();

        Ok(listings)
    }

    async fn asset_detail(
        &self,
        asset_id: &str,
        vs_currency: &str,
    ) -> Result<AssetDetail, MarketDataError> {
        let endpoint = format!("/coins/{}", asset_id);
        let response = self
            .get(
                &endpoint,
                &[
                    ("localization", "false"),
                    ("tickers", "false"),
                    ("market_data", "true"),
                    ("community_data", "false"),
                    ("developer_data", "false"),
                ],
            )
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(MarketDataError::AssetNotFound(asset_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(MarketDataError::DataSourceUnavailable(format!(
                "coin detail returned status {}",
                response.status()
            )));
        }

        let detail: CoinDetailResponse = response.json().await?;

        let market_data = detail.market_data.ok_or_else(|| {
            MarketDataError::DataSourceUnavailable(format!(
                "coin detail for {} has no market_data block",
                asset_id
            ))
        })?;
        let current_price = market_data
            .current_price
            .get(vs_currency)
            .copied()
            .ok_or_else(|| {
                MarketDataError::DataSourceUnavailable(format!(
                    "coin detail for {} has no {} price",
                    asset_id, vs_currency
                ))
            })?;

        let description = detail
            .description
            .get("en")
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let quote = crate::models::PriceQuote {
            asset_id: detail.id.clone(),
            current_price,
            percent_change_24h: market_data.price_change_percentage_24h,
            percent_change_7d: market_data.price_change_percentage_7d,
            percent_change_30d: market_data.price_change_percentage_30d,
            market_cap: market_data.market_cap.get(vs_currency).copied(),
            rank: detail.market_cap_rank,
            high_24h: market_data.high_24h.get(vs_currency).copied(),
            low_24h: market_data.low_24h.get(vs_currency).copied(),
            as_of: Utc::now(),
        };

        Ok(AssetDetail {
            asset: Asset {
                id: detail.id,
                symbol: detail.symbol,
                name: detail.name,
            },
            description,
            quote,
        })
    }
}
