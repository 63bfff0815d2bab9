//! Versioned account catalog
//!
//! All mutations go through [`AccountAction`] and the pure [`reduce`]
//! function. [`AccountStore`] swaps in the reduced state atomically and
//! notifies subscribers, so readers never observe a partially applied
//! action.

use crate::account::{addresses_equal, Account, AccountKey, Wallet};
use crate::transfer::Transfer;
use crate::{ColorTag, Error, Result};
use neon_params::ChainId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot of the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    /// Incremented on every applied action
    pub version: u64,
    /// Wallets in insertion order
    pub wallets: Vec<Wallet>,
    /// Accounts across all wallets
    pub accounts: Vec<Account>,
    /// Locally submitted, unconfirmed transfers
    #[serde(default)]
    pub pending_transfers: Vec<Transfer>,
}

impl AccountState {
    /// Build a state from persisted records
    pub fn from_records(wallets: Vec<Wallet>, accounts: Vec<Account>) -> Self {
        Self {
            version: 0,
            wallets,
            accounts,
            pending_transfers: Vec::new(),
        }
    }

    /// Wallet by id
    pub fn wallet(&self, wallet_id: &str) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.id == wallet_id)
    }

    /// Accounts of a wallet sorted by `order`
    pub fn accounts_for_wallet(&self, wallet_id: &str) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter(|a| a.wallet_id == wallet_id)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.order);
        accounts
    }

    /// Account by chain and address
    pub fn find_account(&self, chain: ChainId, address: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.chain == chain && a.has_address(address))
    }

    /// Whether any wallet holds `address` on any chain
    pub fn does_account_exist(&self, address: &str) -> bool {
        self.accounts.iter().any(|a| a.has_address(address))
    }

    fn position(&self, key: &AccountKey) -> Result<usize> {
        self.accounts
            .iter()
            .position(|a| key.matches(a.chain, &a.address))
            .ok_or_else(|| Error::AccountNotFound(key.to_string()))
    }
}

/// Catalog mutations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountAction {
    /// Add a wallet
    AddWallet(Wallet),
    /// Remove a wallet and its accounts
    RemoveWallet {
        /// Wallet id
        wallet_id: String,
    },
    /// Rename a wallet
    RenameWallet {
        /// Wallet id
        wallet_id: String,
        /// New name
        name: String,
    },
    /// Append an account to its wallet
    AddAccount(Account),
    /// Remove an account; the wallet is kept
    RemoveAccount(AccountKey),
    /// Rename an account
    RenameAccount {
        /// Account
        key: AccountKey,
        /// New name
        name: String,
    },
    /// Change an account's color
    EditAccount {
        /// Account
        key: AccountKey,
        /// New color
        color: ColorTag,
    },
    /// Assign a dense order to all accounts of a wallet
    ReorderAccounts {
        /// Wallet id
        wallet_id: String,
        /// Every account of the wallet in its new order
        order: Vec<AccountKey>,
    },
    /// Track a locally submitted transfer
    AddPendingTransfer(Transfer),
    /// Drop a pending transfer by hash
    RemovePendingTransfer {
        /// Transaction hash
        hash: String,
    },
    /// Drop all pending transfers
    RemoveAllPendingTransfers,
}

/// Apply an action to a state, returning the next state.
///
/// The input is never modified; on error the caller keeps the old state.
pub fn reduce(state: &AccountState, action: AccountAction) -> Result<AccountState> {
    let mut next = state.clone();
    match action {
        AccountAction::AddWallet(wallet) => {
            if next.wallet(&wallet.id).is_some() {
                return Err(Error::WalletAlreadyExists(wallet.id));
            }
            if !wallet.wallet_type.stores_keys() && wallet.encrypted_mnemonic.is_some() {
                return Err(Error::HardwareKeyMaterial(wallet.id));
            }
            next.wallets.push(wallet);
        }
        AccountAction::RemoveWallet { wallet_id } => {
            if next.wallet(&wallet_id).is_none() {
                return Err(Error::WalletNotFound(wallet_id));
            }
            next.wallets.retain(|w| w.id != wallet_id);
            next.accounts.retain(|a| a.wallet_id != wallet_id);
        }
        AccountAction::RenameWallet { wallet_id, name } => {
            let wallet = next
                .wallets
                .iter_mut()
                .find(|w| w.id == wallet_id)
                .ok_or(Error::WalletNotFound(wallet_id))?;
            wallet.name = name;
        }
        AccountAction::AddAccount(mut account) => {
            let wallet = next
                .wallet(&account.wallet_id)
                .ok_or_else(|| Error::WalletNotFound(account.wallet_id.clone()))?;
            if !wallet.wallet_type.stores_keys() && account.encrypted_key.is_some() {
                return Err(Error::HardwareKeyMaterial(account.address));
            }
            if account.address.is_empty() {
                return Err(Error::InvalidAddress(String::new()));
            }
            if next.find_account(account.chain, &account.address).is_some() {
                return Err(Error::AccountAlreadyExists(account.key().to_string()));
            }
            account.order = next
                .accounts
                .iter()
                .filter(|a| a.wallet_id == account.wallet_id)
                .map(|a| a.order + 1)
                .max()
                .unwrap_or(0);
            next.accounts.push(account);
        }
        AccountAction::RemoveAccount(key) => {
            let index = next.position(&key)?;
            next.accounts.remove(index);
        }
        AccountAction::RenameAccount { key, name } => {
            let index = next.position(&key)?;
            next.accounts[index].name = name;
        }
        AccountAction::EditAccount { key, color } => {
            let index = next.position(&key)?;
            next.accounts[index].color = color;
        }
        AccountAction::ReorderAccounts { wallet_id, order } => {
            if next.wallet(&wallet_id).is_none() {
                return Err(Error::WalletNotFound(wallet_id));
            }
            let members: Vec<usize> = next
                .accounts
                .iter()
                .enumerate()
                .filter(|(_, a)| a.wallet_id == wallet_id)
                .map(|(i, _)| i)
                .collect();

            let mut assigned = Vec::with_capacity(order.len());
            for key in &order {
                let index = members
                    .iter()
                    .copied()
                    .find(|&i| key.matches(next.accounts[i].chain, &next.accounts[i].address))
                    .ok_or_else(|| {
                        Error::InvalidOrder(format!("{} is not in wallet {}", key, wallet_id))
                    })?;
                assigned.push(index);
            }
            let distinct: HashSet<usize> = assigned.iter().copied().collect();
            if assigned.len() != members.len() || distinct.len() != members.len() {
                return Err(Error::InvalidOrder(format!(
                    "expected {} distinct accounts for wallet {}, got {}",
                    members.len(),
                    wallet_id,
                    distinct.len()
                )));
            }
            for (position, index) in assigned.into_iter().enumerate() {
                next.accounts[index].order = position as u32;
            }
        }
        AccountAction::AddPendingTransfer(mut transfer) => {
            transfer.pending = true;
            next.pending_transfers.retain(|t| t.hash != transfer.hash);
            next.pending_transfers.push(transfer);
        }
        AccountAction::RemovePendingTransfer { hash } => {
            next.pending_transfers.retain(|t| t.hash != hash);
        }
        AccountAction::RemoveAllPendingTransfers => {
            next.pending_transfers.clear();
        }
    }
    next.version = state.version + 1;
    Ok(next)
}

/// Shared, observable account catalog
pub struct AccountStore {
    state: RwLock<Arc<AccountState>>,
    changes: watch::Sender<Arc<AccountState>>,
}

impl AccountStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_state(AccountState::default())
    }

    /// Create a store from a loaded state
    pub fn with_state(state: AccountState) -> Self {
        let state = Arc::new(state);
        let (changes, _) = watch::channel(state.clone());
        Self {
            state: RwLock::new(state),
            changes,
        }
    }

    /// Apply an action; returns the new version
    pub fn dispatch(&self, action: AccountAction) -> Result<u64> {
        let mut guard = self.state.write();
        let next = match reduce(&guard, action) {
            Ok(next) => Arc::new(next),
            Err(e) => {
                tracing::debug!(error = %e, "Account action rejected");
                return Err(e);
            }
        };
        let version = next.version;
        *guard = next.clone();
        drop(guard);
        self.changes.send_replace(next);
        tracing::debug!(version, "Account state updated");
        Ok(version)
    }

    /// Apply several actions as one update; nothing is applied if any fails
    pub fn dispatch_batch(&self, actions: Vec<AccountAction>) -> Result<u64> {
        let mut guard = self.state.write();
        let mut next: AccountState = (**guard).clone();
        for action in actions {
            next = reduce(&next, action)?;
        }
        let next = Arc::new(next);
        let version = next.version;
        *guard = next.clone();
        drop(guard);
        self.changes.send_replace(next);
        tracing::debug!(version, "Account state updated in batch");
        Ok(version)
    }

    /// Current state
    pub fn snapshot(&self) -> Arc<AccountState> {
        self.state.read().clone()
    }

    /// Current version
    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    /// All accounts
    pub fn accounts(&self) -> Vec<Account> {
        self.state.read().accounts.clone()
    }

    /// Accounts of a wallet in display order
    pub fn accounts_for_wallet(&self, wallet_id: &str) -> Vec<Account> {
        self.state.read().accounts_for_wallet(wallet_id)
    }

    /// All wallets
    pub fn wallets(&self) -> Vec<Wallet> {
        self.state.read().wallets.clone()
    }

    /// Whether any wallet holds `address` on any chain
    pub fn does_account_exist(&self, address: &str) -> bool {
        self.state.read().does_account_exist(address)
    }

    /// Account by chain and address
    pub fn find_account(&self, chain: ChainId, address: &str) -> Option<Account> {
        self.state.read().find_account(chain, address).cloned()
    }

    /// Pending transfers, optionally restricted to a set of accounts
    pub fn pending_transfers(&self, accounts: Option<&[AccountKey]>) -> Vec<Transfer> {
        let state = self.state.read();
        state
            .pending_transfers
            .iter()
            .filter(|t| match accounts {
                Some(keys) => keys.iter().any(|k| {
                    k.chain == t.account.chain
                        && addresses_equal(k.chain, &k.address, &t.account.address)
                }),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Receive every new state after it is applied
    pub fn subscribe(&self) -> watch::Receiver<Arc<AccountState>> {
        self.changes.subscribe()
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WalletType;

    fn seeded() -> AccountStore {
        let store = AccountStore::new();
        store
            .dispatch(AccountAction::AddWallet(Wallet::new("w1", "Main", WalletType::Standard)))
            .unwrap();
        for address in ["Na", "Nb", "Nc"] {
            store
                .dispatch(AccountAction::AddAccount(Account::new(
                    ChainId::Neo3,
                    address,
                    "w1",
                    address,
                )))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_add_account_appends_order() {
        let store = seeded();
        let orders: Vec<u32> = store
            .accounts_for_wallet("w1")
            .iter()
            .map(|a| a.order)
            .collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(store.version(), 4);
    }

    #[test]
    fn test_duplicate_address_rejected_per_chain() {
        let store = seeded();
        let dup = Account::new(ChainId::Neo3, "Na", "w1", "again");
        assert!(matches!(
            store.dispatch(AccountAction::AddAccount(dup)),
            Err(Error::AccountAlreadyExists(_))
        ));
        let other_chain = Account::new(ChainId::NeoLegacy, "Na", "w1", "legacy twin");
        assert!(store.dispatch(AccountAction::AddAccount(other_chain)).is_ok());
    }

    #[test]
    fn test_hardware_wallet_rejects_key_material() {
        let store = AccountStore::new();
        let mut wallet = Wallet::new("hw", "Ledger", WalletType::Hardware);
        wallet.encrypted_mnemonic = Some("sealed".to_string());
        assert!(matches!(
            store.dispatch(AccountAction::AddWallet(wallet.clone())),
            Err(Error::HardwareKeyMaterial(_))
        ));

        wallet.encrypted_mnemonic = None;
        store.dispatch(AccountAction::AddWallet(wallet)).unwrap();
        let mut account = Account::new(ChainId::Neo3, "Nh", "hw", "hw");
        account.encrypted_key = Some("sealed".to_string());
        assert!(store.dispatch(AccountAction::AddAccount(account)).is_err());
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_remove_last_account_keeps_wallet() {
        let store = AccountStore::new();
        store
            .dispatch(AccountAction::AddWallet(Wallet::new("w", "W", WalletType::WatchOnly)))
            .unwrap();
        store
            .dispatch(AccountAction::AddAccount(Account::new(ChainId::Neo3, "Nw", "w", "x")))
            .unwrap();
        store
            .dispatch(AccountAction::RemoveAccount(AccountKey::new(ChainId::Neo3, "Nw")))
            .unwrap();
        assert!(store.accounts_for_wallet("w").is_empty());
        assert_eq!(store.wallets().len(), 1);
    }

    #[test]
    fn test_partial_reorder_rejected_without_change() {
        let store = seeded();
        let before = store.snapshot();
        let result = store.dispatch(AccountAction::ReorderAccounts {
            wallet_id: "w1".to_string(),
            order: vec![AccountKey::new(ChainId::Neo3, "Nc")],
        });
        assert!(matches!(result, Err(Error::InvalidOrder(_))));
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let store = seeded();
        let version = store.version();
        let result = store.dispatch_batch(vec![
            AccountAction::AddAccount(Account::new(ChainId::Neo3, "Nd", "w1", "d")),
            AccountAction::AddAccount(Account::new(ChainId::Neo3, "Na", "w1", "dup")),
        ]);
        assert!(result.is_err());
        assert_eq!(store.version(), version);
        assert!(!store.does_account_exist("Nd"));
    }

    #[test]
    fn test_does_account_exist_across_chains() {
        let store = seeded();
        assert!(store.does_account_exist("Nb"));
        assert!(!store.does_account_exist("Nz"));
    }

    #[tokio::test]
    async fn test_subscribe_sees_new_version() {
        let store = seeded();
        let mut rx = store.subscribe();
        store
            .dispatch(AccountAction::RenameWallet {
                wallet_id: "w1".to_string(),
                name: "Renamed".to_string(),
            })
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().wallets[0].name, "Renamed");
    }
}
