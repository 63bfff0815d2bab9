//! Service errors

/// Service errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Storage failure
    #[error(transparent)]
    Storage(#[from] neon_storage::StorageError),

    /// Catalog or chain failure
    #[error(transparent)]
    Core(#[from] neon_core::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, ServiceError>;
