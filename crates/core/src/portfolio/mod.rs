//! Portfolio module - ledger models, services, and traits.

mod ledger_service;
mod ledger_traits;
mod positions_model;
mod store;

#[cfg(test)]
mod ledger_service_tests;

// Re-export the public interface
pub use ledger_service::{LedgerService, PortfolioValuation, PositionValuation};
pub use ledger_traits::{LedgerServiceTrait, PortfolioRepositoryTrait};
pub use positions_model::{PortfolioRecord, Position, PurchaseEvent};
pub use store::InMemoryPortfolioStore;
