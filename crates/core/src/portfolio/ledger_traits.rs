use super::ledger_service::PortfolioValuation;
use super::positions_model::{PortfolioRecord, Position, PurchaseEvent};
use crate::errors::Result;

/// Trait defining the contract for ledger operations.
#[async_trait::async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    /// Merge a purchase into the owner's position set, creating the
    /// portfolio implicitly on the first successful merge. Returns the
    /// post-merge position.
    async fn merge(&self, owner: &str, event: PurchaseEvent) -> Result<Position>;

    /// Value the owner's positions against live prices. `Ok(None)` when the
    /// owner has no recorded purchases.
    async fn valuate(&self, owner: &str) -> Result<Option<PortfolioValuation>>;
}

/// Trait defining the contract for the owner-scoped portfolio store.
///
/// The store holds one JSON-like document per owner. `save` is a single
/// atomic write covering the owner's full position set; there is no
/// per-position write path. Storage-specific failures are mapped to
/// [`Error::PersistenceFailure`](crate::errors::Error::PersistenceFailure)
/// by implementations.
#[async_trait::async_trait]
pub trait PortfolioRepositoryTrait: Send + Sync {
    /// Read the full record for an owner. `Ok(None)` when the owner has
    /// never merged a purchase.
    async fn load(&self, owner: &str) -> Result<Option<PortfolioRecord>>;

    /// Replace the full record for an owner. Last-writer-wins.
    async fn save(&self, owner: &str, record: &PortfolioRecord) -> Result<()>;
}
