//! Neon wallet service
//!
//! Startup orchestration over the storage, catalog, feed and session crates:
//! resolves the data directory, runs the legacy upgrade, restores the account
//! catalog and wires the authenticated address into the session router.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod service;

pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use logging::init_logging;
pub use service::{ServiceDeps, WalletService};
