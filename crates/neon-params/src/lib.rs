//! Neon wallet chain and network parameters
//!
//! This crate provides the chain identifiers understood by the wallet core,
//! the network selection, and the CAIP-2 naming used by dApp sessions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chain;
pub mod network;

pub use chain::ChainId;
pub use network::{Network, NetworkType};

/// Error types for parameter operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown chain identifier
    #[error("Invalid chain: {0}")]
    InvalidChain(String),

    /// Unknown network name
    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    /// Malformed CAIP-10 account identifier
    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),
}

/// Result type for parameter operations
pub type Result<T> = std::result::Result<T, Error>;
