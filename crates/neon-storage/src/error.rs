//! Error types

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Data directory could not be resolved or created
    #[error("Storage path unavailable: {0}")]
    PathUnavailable(String),

    /// Sealing or unsealing failed
    #[error("Crypto failure: {0}")]
    CryptoFailure(String),

    /// Stored bytes are not the expected JSON
    #[error("Corrupt payload for {key}: {reason}")]
    CorruptPayload {
        /// Record key
        key: String,
        /// Parser message
        reason: String,
    },

    /// Key cannot be mapped to a file name
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Passphrase rules not met
    #[error("Security error: {0}")]
    Security(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Legacy upgrade errors
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Upgrade could not complete; retried on next startup
    #[error("Error upgrading legacy wallet: {0}")]
    UpgradeFailed(String),
}

impl From<StorageError> for MigrationError {
    fn from(e: StorageError) -> Self {
        MigrationError::UpgradeFailed(e.to_string())
    }
}

impl From<neon_core::Error> for MigrationError {
    fn from(e: neon_core::Error) -> Self {
        MigrationError::UpgradeFailed(e.to_string())
    }
}
