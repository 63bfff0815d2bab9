//! Activity feed aggregation for Neon wallet
//!
//! Fetches transaction history page by page for a set of accounts across
//! chains, isolates per-account failures, and overlays locally pending
//! transfers. Also pages through NFT holdings for chains that support it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregator;
pub mod error;
pub mod nft;

pub use aggregator::{PageReport, PageState, TransactionAggregator};
pub use error::{AggregationError, Result};
pub use nft::NftCollector;
