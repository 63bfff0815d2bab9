//! Error types

/// Session errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Disconnect failed; logged and not retried
    #[error("Failed to disconnect session {topic}: {reason}")]
    DisconnectFailed {
        /// Session topic
        topic: String,
        /// Transport message
        reason: String,
    },

    /// Transport reported an error
    #[error("Session transport error: {0}")]
    Transport(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, SessionError>;
