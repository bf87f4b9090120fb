//! Core error types for the portfolio ledger.
//!
//! Storage-specific errors are converted to [`Error::PersistenceFailure`] by
//! repository implementations, keeping this type store-agnostic. Nothing in
//! this taxonomy is fatal to the hosting process.

use thiserror::Error;

use cryptofolio_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for ledger operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The external price source failed or timed out. Recoverable; the
    /// caller should retry later.
    #[error("Market data source unavailable: {0}")]
    DataSourceUnavailable(String),

    /// The purchase identifier did not resolve within the ranked window.
    /// Terminal for the request; user-facing "not found".
    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    /// Quantity or unit price out of domain. Terminal for the request;
    /// user-facing correction prompt. No mutation was performed.
    #[error("Invalid purchase: {0}")]
    InvalidPurchase(String),

    /// The owner store read or write failed. Recoverable; surfaced as
    /// "try again".
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl From<MarketDataError> for Error {
    fn from(err: MarketDataError) -> Self {
        match err {
            MarketDataError::DataSourceUnavailable(reason) => Error::DataSourceUnavailable(reason),
            MarketDataError::AssetNotFound(identifier) => Error::UnknownAsset(identifier),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::PersistenceFailure(format!("document encoding failed: {}", err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
