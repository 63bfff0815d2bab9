//! Error types for Neon Core
//!
//! Error taxonomy for account catalog mutations and chain service calls.

use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Neon Core errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wallet not found
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    /// Wallet already exists
    #[error("Wallet already exists: {0}")]
    WalletAlreadyExists(String),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account already exists on the chain
    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    /// Hardware wallets never hold local key material
    #[error("Hardware wallet cannot store key material: {0}")]
    HardwareKeyMaterial(String),

    /// Reorder request is not a permutation of the wallet's accounts
    #[error("Invalid account order: {0}")]
    InvalidOrder(String),

    /// Invalid address
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// No service registered for chain
    #[error("Chain not supported: {0}")]
    ChainUnsupported(String),

    /// Network error reported by a chain service
    #[error("Network error: {0}")]
    Network(String),

    /// Parameter error
    #[error(transparent)]
    Params(#[from] neon_params::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Check if error is a user-facing error (vs internal error)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::AccountAlreadyExists(_)
                | Error::WalletAlreadyExists(_)
                | Error::InvalidAddress(_)
                | Error::HardwareKeyMaterial(_)
                | Error::Network(_)
        )
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Error::AccountAlreadyExists(_) => {
                "This account is already in your wallet.".to_string()
            }
            Error::WalletAlreadyExists(_) => "A wallet with this id already exists.".to_string(),
            Error::InvalidAddress(_) => {
                "The address is invalid. Please check and try again.".to_string()
            }
            Error::HardwareKeyMaterial(_) => {
                "Hardware wallet keys stay on the device and cannot be imported.".to_string()
            }
            Error::Network(_) => {
                "Unable to reach the network. Please check your connection and try again."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::WalletNotFound(_)
            | Error::WalletAlreadyExists(_)
            | Error::HardwareKeyMaterial(_) => ErrorCategory::Wallet,
            Error::AccountNotFound(_)
            | Error::AccountAlreadyExists(_)
            | Error::InvalidOrder(_) => ErrorCategory::Account,
            Error::InvalidAddress(_) => ErrorCategory::Address,
            Error::ChainUnsupported(_) | Error::Params(_) => ErrorCategory::Chain,
            Error::Network(_) => ErrorCategory::Network,
            Error::Io(_) | Error::Serialization(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Wallet-related errors
    Wallet,
    /// Account-related errors
    Account,
    /// Address-related errors
    Address,
    /// Chain selection errors
    Chain,
    /// Network-related errors
    Network,
    /// Internal/system errors
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Wallet => "Wallet",
            ErrorCategory::Account => "Account",
            ErrorCategory::Address => "Address",
            ErrorCategory::Chain => "Chain",
            ErrorCategory::Network => "Network",
            ErrorCategory::Internal => "Internal",
        };
        f.write_str(name)
    }
}
