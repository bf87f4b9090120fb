//! Error types for market data operations.

use thiserror::Error;

/// Type alias for Result using [`MarketDataError`].
pub type Result<T> = std::result::Result<T, MarketDataError>;

/// Errors that can occur while fetching or resolving market data.
///
/// Every failure mode of the external price source (non-success status,
/// transport error, timeout, undecodable payload) collapses into
/// [`DataSourceUnavailable`](Self::DataSourceUnavailable): callers retry
/// later, they never branch on the transport detail.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The external price source failed or timed out. Recoverable.
    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    /// The identifier did not resolve to any asset in the ranked window.
    /// Terminal for the request.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MarketDataError::DataSourceUnavailable("request timed out".to_string())
        } else {
            MarketDataError::DataSourceUnavailable(err.to_string())
        }
    }
}
