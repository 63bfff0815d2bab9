//! Neon wallet core
//!
//! Domain model shared by the wallet crates: wallets and accounts, the
//! versioned account store, transfers, per-chain service capabilities and
//! user-facing notifications.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod account_store;
pub mod blockchain;
pub mod error;
pub mod notification;
pub mod transfer;

pub use account::{Account, AccountKey, ColorTag, Wallet, WalletType};
pub use account_store::{reduce, AccountAction, AccountState, AccountStore};
pub use blockchain::{
    BlockchainService, BlockchainServiceRegistry, ChainTransaction, ChainTransfer, Nft,
    NftDataService, NftsPage, NftsQuery, TransactionsPage, TransactionsQuery, TransferKind,
};
pub use error::{Error, ErrorCategory, Result};
pub use notification::{Notification, NotificationLevel};
pub use transfer::{Asset, Transfer, TransferDirection};

pub use neon_params::{ChainId, NetworkType};
