//! Legacy wallet upgrade
//!
//! Older releases kept a single NEP-6 style wallet under `userWallet`. On
//! startup it is folded into the account catalog as one `legacy` wallet.
//! Completion is recorded under `migration-state`; the marker is only
//! written after the catalog is saved, so a failed run is retried on the
//! next startup. The legacy record itself is left in place, sealed.

use crate::account_repository::AccountRepository;
use crate::error::{MigrationError, StorageError};
use crate::gateway::SecureStorageGateway;
use neon_core::{Account, AccountAction, AccountStore, ChainId, Wallet, WalletType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Legacy single-wallet record key
pub const LEGACY_WALLET_KEY: &str = "userWallet";
/// Migration marker key
pub const MIGRATION_STATE_KEY: &str = "migration-state";
/// Marker version written by this release
pub const CURRENT_MIGRATION_VERSION: u32 = 1;

/// Completion marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationState {
    /// Highest migration applied
    pub version: u32,
    /// Unix seconds of completion
    pub completed_at: i64,
}

#[derive(Debug, Deserialize)]
struct LegacyWallet {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    accounts: Vec<LegacyAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyAccount {
    address: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    is_default: bool,
}

/// Result of a coordinator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Marker already current
    AlreadyCurrent,
    /// Nothing to upgrade
    NoLegacyRecord,
    /// Legacy record folded into the catalog
    Upgraded {
        /// New wallet, absent when every account already existed
        wallet_id: Option<String>,
        /// Accounts added
        imported: usize,
        /// Accounts already present
        skipped: usize,
    },
}

/// Runs the one-time legacy upgrade
pub struct MigrationCoordinator {
    gateway: Arc<SecureStorageGateway>,
    store: Arc<AccountStore>,
}

impl MigrationCoordinator {
    /// Create a coordinator over the catalog and its storage
    pub fn new(gateway: Arc<SecureStorageGateway>, store: Arc<AccountStore>) -> Self {
        Self { gateway, store }
    }

    /// Upgrade the legacy record if it has not been upgraded yet
    pub fn run(&self) -> Result<MigrationOutcome, MigrationError> {
        let marker: Option<MigrationState> = self.gateway.read_value(MIGRATION_STATE_KEY)?;
        if marker.is_some_and(|m| m.version >= CURRENT_MIGRATION_VERSION) {
            tracing::debug!("Migration marker current, skipping legacy upgrade");
            return Ok(MigrationOutcome::AlreadyCurrent);
        }

        let Some(record) = self.gateway.read(LEGACY_WALLET_KEY)? else {
            self.mark_complete()?;
            return Ok(MigrationOutcome::NoLegacyRecord);
        };
        let legacy: LegacyWallet =
            serde_json::from_value(record.clone()).map_err(|e| StorageError::CorruptPayload {
                key: LEGACY_WALLET_KEY.to_string(),
                reason: e.to_string(),
            })?;

        let mut fresh: Vec<LegacyAccount> = Vec::new();
        let mut skipped = 0;
        for account in legacy.accounts {
            let seen = fresh.iter().any(|a| a.address == account.address);
            if seen || self.store.does_account_exist(&account.address) {
                skipped += 1;
            } else {
                fresh.push(account);
            }
        }
        fresh.sort_by_key(|a| !a.is_default);

        let imported = fresh.len();
        let wallet_id = if fresh.is_empty() {
            None
        } else {
            let wallet_id = uuid::Uuid::new_v4().to_string();
            let name = legacy.name.unwrap_or_else(|| "Legacy Wallet".to_string());
            let mut actions = vec![AccountAction::AddWallet(Wallet::new(
                wallet_id.clone(),
                name,
                WalletType::Legacy,
            ))];
            for (i, legacy_account) in fresh.into_iter().enumerate() {
                let label = legacy_account
                    .label
                    .unwrap_or_else(|| format!("Account {}", i + 1));
                let mut account =
                    Account::new(ChainId::NeoLegacy, legacy_account.address, &wallet_id, label);
                account.encrypted_key = legacy_account.key;
                actions.push(AccountAction::AddAccount(account));
            }
            self.store.dispatch_batch(actions)?;
            AccountRepository::new(self.gateway.clone()).save(&self.store.snapshot())?;
            Some(wallet_id)
        };

        self.gateway.write(LEGACY_WALLET_KEY, &record, true)?;
        self.mark_complete()?;
        tracing::info!(imported, skipped, "Upgraded legacy wallet");
        Ok(MigrationOutcome::Upgraded {
            wallet_id,
            imported,
            skipped,
        })
    }

    fn mark_complete(&self) -> Result<(), MigrationError> {
        let state = MigrationState {
            version: CURRENT_MIGRATION_VERSION,
            completed_at: chrono::Utc::now().timestamp(),
        };
        self.gateway
            .write_value(MIGRATION_STATE_KEY, &state, false)
            .map_err(MigrationError::from)
    }
}
