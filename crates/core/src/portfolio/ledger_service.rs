//! Portfolio ledger service: purchase merging and live valuation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use cryptofolio_market_data::{AssetResolver, PriceQuote};

use super::ledger_traits::{LedgerServiceTrait, PortfolioRepositoryTrait};
use super::positions_model::{PortfolioRecord, Position, PurchaseEvent};
use crate::errors::Result;

/// One position joined with its live quote, when available.
///
/// Price-derived fields are `None` when the quote fetch for this asset
/// failed; `invested_value` is always present since it depends only on the
/// stored cost basis.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    #[serde(flatten)]
    pub position: Position,
    pub invested_value: Decimal,
    pub current_price: Option<Decimal>,
    pub current_value: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
    pub profit_loss_percent: Option<Decimal>,
    pub percent_change_24h: Option<Decimal>,
}

/// An owner's full valuation snapshot.
///
/// `total_current_value` and `total_profit_loss` aggregate only the positions
/// that have a live price; `total_invested` covers every position since cost
/// basis needs no market data.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub owner: String,
    pub positions: Vec<PositionValuation>,
    pub total_invested: Decimal,
    pub total_current_value: Decimal,
    pub total_profit_loss: Decimal,
    pub total_profit_loss_percent: Option<Decimal>,
    pub last_updated: DateTime<Utc>,
}

/// Ledger over an owner-scoped store, with market access via the resolver.
///
/// Merges for the same owner are serialized by a per-owner lock held across
/// the read-modify-write span, so concurrent purchases are never silently
/// dropped by a lost update.
pub struct LedgerService {
    resolver: Arc<AssetResolver>,
    repository: Arc<dyn PortfolioRepositoryTrait>,
    owner_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LedgerService {
    pub fn new(
        resolver: Arc<AssetResolver>,
        repository: Arc<dyn PortfolioRepositoryTrait>,
    ) -> Self {
        Self {
            resolver,
            repository,
            owner_locks: DashMap::new(),
        }
    }

    fn owner_lock(&self, owner: &str) -> Arc<Mutex<()>> {
        self.owner_locks
            .entry(owner.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn valuate_position(position: &Position, quote: Option<&PriceQuote>) -> PositionValuation {
        let invested_value = position.invested_value();

        match quote {
            Some(quote) => {
                let current_value = position.quantity * quote.current_price;
                let profit_loss = current_value - invested_value;
                let profit_loss_percent = if invested_value > Decimal::ZERO {
                    Some(profit_loss / invested_value * Decimal::ONE_HUNDRED)
                } else {
                    None
                };
                PositionValuation {
                    position: position.clone(),
                    invested_value,
                    current_price: Some(quote.current_price),
                    current_value: Some(current_value),
                    profit_loss: Some(profit_loss),
                    profit_loss_percent,
                    percent_change_24h: quote.percent_change_24h,
                }
            }
            None => PositionValuation {
                position: position.clone(),
                invested_value,
                current_price: None,
                current_value: None,
                profit_loss: None,
                profit_loss_percent: None,
                percent_change_24h: None,
            },
        }
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    async fn merge(&self, owner: &str, event: PurchaseEvent) -> Result<Position> {
        event.validate()?;

        // Resolve before touching the store: a failed resolution aborts the
        // merge with no persistence write.
        let asset = self.resolver.resolve(&event.asset_id).await?;

        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;

        let mut record = self
            .repository
            .load(owner)
            .await?
            .unwrap_or_else(PortfolioRecord::empty);

        let position = match record.position_mut(&asset.id) {
            Some(existing) => {
                existing.apply_purchase(&asset, &event);
                existing.clone()
            }
            None => {
                let opened = Position::open(&asset, &event);
                record.positions.push(opened.clone());
                opened
            }
        };

        self.repository.save(owner, &record).await?;
        debug!(
            "merged purchase of {} {} for owner {}",
            event.quantity, asset.id, owner
        );
        Ok(position)
    }

    async fn valuate(&self, owner: &str) -> Result<Option<PortfolioValuation>> {
        let record = match self.repository.load(owner).await? {
            Some(record) if !record.positions.is_empty() => record,
            _ => return Ok(None),
        };

        let quotes = join_all(
            record
                .positions
                .iter()
                .map(|p| self.resolver.quote(&p.asset_id)),
        )
        .await;

        let mut positions = Vec::with_capacity(record.positions.len());
        let mut total_invested = Decimal::ZERO;
        let mut total_current_value = Decimal::ZERO;
        let mut priced_invested = Decimal::ZERO;

        for (position, quote) in record.positions.iter().zip(quotes) {
            let quote = match quote {
                Ok(quote) => Some(quote),
                Err(e) => {
                    warn!(
                        "no live quote for {} in owner {} valuation: {}",
                        position.asset_id, owner, e
                    );
                    None
                }
            };

            let valuation = Self::valuate_position(position, quote.as_ref());
            total_invested += valuation.invested_value;
            if let Some(current_value) = valuation.current_value {
                total_current_value += current_value;
                priced_invested += valuation.invested_value;
            }
            positions.push(valuation);
        }

        let total_profit_loss = total_current_value - priced_invested;
        let total_profit_loss_percent = if priced_invested > Decimal::ZERO {
            Some(total_profit_loss / priced_invested * Decimal::ONE_HUNDRED)
        } else {
            None
        };

        let now = Utc::now();

        // Record the successful read-back. The write-back happens under the
        // owner lock against a fresh load, so it cannot clobber a merge that
        // landed while quotes were in flight. Best-effort: a failed
        // write-back must not fail the view itself.
        {
            let lock = self.owner_lock(owner);
            let _guard = lock.lock().await;
            match self.repository.load(owner).await {
                Ok(Some(mut latest)) => {
                    latest.last_updated = now;
                    if let Err(e) = self.repository.save(owner, &latest).await {
                        warn!("failed to persist last_updated for owner {}: {}", owner, e);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("failed to reload record for owner {}: {}", owner, e),
            }
        }

        Ok(Some(PortfolioValuation {
            owner: owner.to_string(),
            positions,
            total_invested,
            total_current_value,
            total_profit_loss,
            total_profit_loss_percent,
            last_updated: now,
        }))
    }
}
