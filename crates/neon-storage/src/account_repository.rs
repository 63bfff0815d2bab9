//! Persistence for the account catalog

use crate::gateway::SecureStorageGateway;
use crate::Result;
use neon_core::{Account, AccountState, Wallet};
use std::sync::Arc;

/// Wallet list record key
pub const WALLETS_KEY: &str = "wallets";
/// Account list record key
pub const ACCOUNTS_KEY: &str = "accounts";

/// Saves and restores wallets and accounts. Pending transfers are session
/// state and are not persisted.
pub struct AccountRepository {
    gateway: Arc<SecureStorageGateway>,
}

impl AccountRepository {
    /// Create a repository
    pub fn new(gateway: Arc<SecureStorageGateway>) -> Self {
        Self { gateway }
    }

    /// Load stored records; empty on first run
    pub fn load(&self) -> Result<AccountState> {
        let wallets: Vec<Wallet> = self.gateway.read_value(WALLETS_KEY)?.unwrap_or_default();
        let accounts: Vec<Account> = self.gateway.read_value(ACCOUNTS_KEY)?.unwrap_or_default();
        tracing::debug!(
            wallets = wallets.len(),
            accounts = accounts.len(),
            "Loaded account catalog"
        );
        Ok(AccountState::from_records(wallets, accounts))
    }

    /// Persist wallets and accounts, sealed since both carry key material
    pub fn save(&self, state: &AccountState) -> Result<()> {
        self.gateway.write_value(WALLETS_KEY, &state.wallets, true)?;
        self.gateway.write_value(ACCOUNTS_KEY, &state.accounts, true)?;
        tracing::debug!(version = state.version, "Saved account catalog");
        Ok(())
    }
}
