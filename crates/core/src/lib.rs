//! Cryptofolio Core - simulated holdings ledger and live valuation.
//!
//! This crate tracks a user's simulated crypto purchases and values them
//! against live market data. It is storage-agnostic: persistence goes through
//! [`portfolio::PortfolioRepositoryTrait`], and market access goes through the
//! `cryptofolio-market-data` crate. The hosting conversational layer consumes
//! the typed results and renders text; no formatting of user-facing messages
//! happens here beyond the helpers in [`utils::format`].

pub mod constants;
pub mod errors;
pub mod portfolio;
pub mod utils;

// Re-export common types
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
