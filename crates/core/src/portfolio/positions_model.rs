use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cryptofolio_market_data::Asset;

use crate::errors::{Error, Result};

/// One owner's holding in one asset.
///
/// `symbol` and `name` are denormalized from the most recent resolution so
/// display layers never need a market round-trip. Quantity and average cost
/// stay strictly positive: a position reduced to zero is removed from the
/// record, never retained as a zero row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub asset_id: String,
    pub symbol: String,
    pub name: String,
    pub quantity: Decimal,
    /// Weighted-average purchase price per unit, in the quote currency.
    pub average_cost: Decimal,
    pub last_purchase_at: DateTime<Utc>,
}

impl Position {
    /// Opens a position from the first purchase of an asset.
    pub fn open(asset: &Asset, event: &PurchaseEvent) -> Self {
        Position {
            asset_id: asset.id.clone(),
            symbol: asset.symbol.clone(),
            name: asset.name.clone(),
            quantity: event.quantity,
            average_cost: event.unit_price,
            last_purchase_at: event.occurred_at,
        }
    }

    /// Folds a purchase into this position using quantity-weighted cost
    /// basis. This is not a simple mean of prices: repeated small purchases
    /// at different prices converge to the true cost basis.
    pub fn apply_purchase(&mut self, asset: &Asset, event: &PurchaseEvent) {
        let total_quantity = self.quantity + event.quantity;
        let total_cost =
            self.quantity * self.average_cost + event.quantity * event.unit_price;

        self.quantity = total_quantity;
        self.average_cost = total_cost / total_quantity;
        self.last_purchase_at = event.occurred_at;
        // Refresh denormalized display fields from the live resolution.
        self.symbol = asset.symbol.clone();
        self.name = asset.name.clone();
    }

    /// Total amount paid for this position, in the quote currency.
    pub fn invested_value(&self) -> Decimal {
        self.quantity * self.average_cost
    }
}

/// Input to a ledger merge: one simulated purchase.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseEvent {
    /// Loosely-specified identifier; resolved before any mutation.
    pub asset_id: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub occurred_at: DateTime<Utc>,
}

impl PurchaseEvent {
    /// Domain validation. A rejected event performs no mutation.
    pub fn validate(&self) -> Result<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(Error::InvalidPurchase(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.unit_price <= Decimal::ZERO {
            return Err(Error::InvalidPurchase(format!(
                "unit price must be positive, got {}",
                self.unit_price
            )));
        }
        Ok(())
    }
}

/// The persisted document for one owner: the full position set plus the
/// timestamp of the most recent successful read-back (set at valuation time,
/// not at mutation time).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRecord {
    pub positions: Vec<Position>,
    pub last_updated: DateTime<Utc>,
}

impl PortfolioRecord {
    pub fn empty() -> Self {
        PortfolioRecord {
            positions: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn position(&self, asset_id: &str) -> Option<&Position> {
        self.positions.iter().find(|p| p.asset_id == asset_id)
    }

    pub fn position_mut(&mut self, asset_id: &str) -> Option<&mut Position> {
        self.positions.iter_mut().find(|p| p.asset_id == asset_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn asset() -> Asset {
        Asset {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
        }
    }

    fn purchase(quantity: Decimal, unit_price: Decimal) -> PurchaseEvent {
        PurchaseEvent {
            asset_id: "bitcoin".to_string(),
            quantity,
            unit_price,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn merge_uses_quantity_weighted_cost_basis() {
        let asset = asset();
        let mut position = Position::open(&asset, &purchase(dec!(1), dec!(100)));
        position.apply_purchase(&asset, &purchase(dec!(3), dec!(140)));

        assert_eq!(position.quantity, dec!(4));
        // (1 * 100 + 3 * 140) / 4 = 130, not the simple mean 120.
        assert_eq!(position.average_cost, dec!(130));
        assert_eq!(position.invested_value(), dec!(520));
    }

    #[test]
    fn repeated_purchases_converge_to_true_cost_basis() {
        let asset = asset();
        let mut position = Position::open(&asset, &purchase(dec!(0.5), dec!(200)));
        position.apply_purchase(&asset, &purchase(dec!(0.5), dec!(200)));
        position.apply_purchase(&asset, &purchase(dec!(1), dec!(300)));

        assert_eq!(position.quantity, dec!(2));
        assert_eq!(position.average_cost, dec!(250));
    }

    #[test]
    fn merge_refreshes_denormalized_display_fields() {
        let asset = asset();
        let mut position = Position::open(&asset, &purchase(dec!(1), dec!(100)));
        position.symbol = "old".to_string();
        position.name = "Old Name".to_string();

        position.apply_purchase(&asset, &purchase(dec!(1), dec!(100)));
        assert_eq!(position.symbol, "btc");
        assert_eq!(position.name, "Bitcoin");
    }

    #[test]
    fn zero_quantity_purchase_is_rejected() {
        let err = purchase(dec!(0), dec!(50)).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidPurchase(_)));
    }

    #[test]
    fn negative_price_purchase_is_rejected() {
        let err = purchase(dec!(1), dec!(-5)).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidPurchase(_)));
    }
}
