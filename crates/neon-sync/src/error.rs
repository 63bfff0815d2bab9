//! Error types

use neon_core::AccountKey;

/// Aggregation errors; always scoped to one account
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregationError {
    /// Fetching one account's page failed; siblings are unaffected
    #[error("Fetch failed for {account} page {page}: {reason}")]
    PerAccountFetchFailed {
        /// Account
        account: AccountKey,
        /// Page requested
        page: u32,
        /// Underlying cause
        reason: String,
    },
}

impl AggregationError {
    /// Account the failure belongs to
    pub fn account(&self) -> &AccountKey {
        match self {
            AggregationError::PerAccountFetchFailed { account, .. } => account,
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, AggregationError>;
