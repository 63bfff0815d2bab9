//! Multi-account transaction feed
//!
//! Every page run fans out one request per account that still has history
//! left and waits for all of them before the current page advances. A
//! failing account gets an empty page with `has_more = false` and drops out
//! of later runs. Results that arrive for accounts which were untracked
//! while the request was in flight are discarded.

use crate::{AggregationError, Result};
use futures::future::join_all;
use neon_core::{
    Account, AccountAction, AccountKey, AccountStore, Asset, BlockchainServiceRegistry, Error,
    Transfer, TransactionsQuery, TransferKind,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// One account's result for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    /// Page number, starting at 1
    pub page_number: u32,
    /// Whether the account has pages after this one
    pub has_more: bool,
    /// Transfers in service order
    pub transfers: Vec<Transfer>,
}

impl PageState {
    fn failed(page_number: u32) -> Self {
        Self {
            page_number,
            has_more: false,
            transfers: Vec::new(),
        }
    }
}

/// Outcome of one page run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReport {
    /// Page fetched; 0 when nothing ran
    pub page: u32,
    /// Accounts queried
    pub requested: usize,
    /// Isolated per-account failures
    pub failures: Vec<AggregationError>,
}

#[derive(Default)]
struct FeedState {
    tracked: Vec<AccountKey>,
    pages: BTreeMap<u32, HashMap<AccountKey, PageState>>,
    current_page: u32,
    generation: u64,
}

impl FeedState {
    fn is_tracked(&self, key: &AccountKey) -> bool {
        self.tracked.contains(key)
    }

    fn latest_has_more(&self) -> Vec<AccountKey> {
        let Some(latest) = self.pages.get(&self.current_page) else {
            return Vec::new();
        };
        self.tracked
            .iter()
            .filter(|key| latest.get(*key).is_some_and(|p| p.has_more))
            .cloned()
            .collect()
    }
}

/// Paginated feed over a set of accounts
pub struct TransactionAggregator {
    registry: Arc<BlockchainServiceRegistry>,
    store: Arc<AccountStore>,
    state: Mutex<FeedState>,
    run_lock: tokio::sync::Mutex<()>,
}

impl TransactionAggregator {
    /// Create an aggregator tracking no accounts
    pub fn new(registry: Arc<BlockchainServiceRegistry>, store: Arc<AccountStore>) -> Self {
        Self {
            registry,
            store,
            state: Mutex::new(FeedState::default()),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Replace the tracked account set.
    ///
    /// Removed accounts lose their pages. Adding an account resets the feed
    /// so every account starts from page 1; returns whether that happened.
    pub fn set_accounts(&self, accounts: &[AccountKey]) -> bool {
        let mut state = self.state.lock();
        let mut seen = HashSet::new();
        let tracked: Vec<AccountKey> = accounts
            .iter()
            .filter(|key| seen.insert((*key).clone()))
            .cloned()
            .collect();

        let added = tracked.iter().any(|key| !state.tracked.contains(key));
        if added {
            state.pages.clear();
            state.current_page = 0;
            state.generation += 1;
        } else {
            for page in state.pages.values_mut() {
                page.retain(|key, _| tracked.contains(key));
            }
        }
        tracing::debug!(accounts = tracked.len(), reset = added, "Tracked accounts changed");
        state.tracked = tracked;
        added
    }

    /// Fetch and convert one page for one account without recording it
    pub async fn fetch_page(&self, account: &AccountKey, page: u32) -> Result<PageState> {
        let fail = |reason: String| AggregationError::PerAccountFetchFailed {
            account: account.clone(),
            page,
            reason,
        };

        let service = self
            .registry
            .get(account.chain)
            .ok_or_else(|| fail(Error::ChainUnsupported(account.chain.to_string()).to_string()))?;
        let response = service
            .transactions_by_address(TransactionsQuery {
                address: account.address.clone(),
                page,
            })
            .await
            .map_err(|e| fail(e.to_string()))?;

        let known = self.store.accounts();
        let mut transfers = Vec::new();
        for tx in &response.transactions {
            for chain_transfer in tx.transfers.iter().filter(|t| t.kind != TransferKind::Nft) {
                let mut transfer = Transfer {
                    time: tx.time,
                    hash: tx.hash.clone(),
                    account: account.clone(),
                    counterparty: None,
                    from: chain_transfer.from.clone(),
                    to: chain_transfer.to.clone(),
                    asset: Asset {
                        hash: chain_transfer.contract_hash.clone(),
                        symbol: chain_transfer.symbol.clone(),
                        decimals: chain_transfer.decimals,
                    },
                    amount: chain_transfer.amount.clone(),
                    direction: Transfer::direction_for(
                        account,
                        &chain_transfer.from,
                        &chain_transfer.to,
                    ),
                    pending: false,
                };
                transfer.resolve_counterparty(&known);
                transfers.push(transfer);
            }
        }

        Ok(PageState {
            page_number: page,
            has_more: response.has_more_after(page),
            transfers,
        })
    }

    /// Start the feed over from page 1
    pub async fn load_first_page(&self) -> PageReport {
        let _run = self.run_lock.lock().await;
        let (accounts, generation) = {
            let mut state = self.state.lock();
            state.pages.clear();
            state.current_page = 0;
            (state.tracked.clone(), state.generation)
        };
        self.run_page(1, accounts, generation).await
    }

    /// Fetch the next page for accounts that reported more history.
    ///
    /// No-op when the latest run left no account with `has_more`.
    pub async fn fetch_next_page(&self) -> PageReport {
        let _run = self.run_lock.lock().await;
        let (page, accounts, generation) = {
            let state = self.state.lock();
            if state.current_page == 0 {
                (1, state.tracked.clone(), state.generation)
            } else {
                (state.current_page + 1, state.latest_has_more(), state.generation)
            }
        };
        if accounts.is_empty() {
            tracing::debug!(page, "No account has more history");
            return PageReport::default();
        }
        self.run_page(page, accounts, generation).await
    }

    async fn run_page(&self, page: u32, accounts: Vec<AccountKey>, generation: u64) -> PageReport {
        tracing::debug!(page, accounts = accounts.len(), "Fetching page");
        let fetches = accounts.iter().map(|key| async move {
            let result = self.fetch_page(key, page).await;
            (key.clone(), result)
        });
        let results = join_all(fetches).await;

        let mut failures = Vec::new();
        let confirmed: HashSet<String>;
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                tracing::debug!(page, "Account set was reset during fetch, discarding run");
                return PageReport {
                    page: 0,
                    requested: accounts.len(),
                    failures,
                };
            }
            let mut recorded = HashMap::new();
            for (key, result) in results {
                if !state.is_tracked(&key) {
                    tracing::debug!(account = %key, page, "Discarding page for untracked account");
                    continue;
                }
                let page_state = match result {
                    Ok(page_state) => page_state,
                    Err(e) => {
                        tracing::warn!(account = %key, page, error = %e, "Account fetch failed");
                        failures.push(e);
                        PageState::failed(page)
                    }
                };
                recorded.insert(key, page_state);
            }
            state.pages.insert(page, recorded);
            state.current_page = page;
            confirmed = state
                .pages
                .values()
                .flat_map(|p| p.values())
                .flat_map(|p| p.transfers.iter().map(|t| t.hash.clone()))
                .collect();
        }

        for pending in self.store.pending_transfers(None) {
            if confirmed.contains(&pending.hash) {
                tracing::info!(hash = %pending.hash, "Pending transfer confirmed");
                if let Err(e) = self.store.dispatch(AccountAction::RemovePendingTransfer {
                    hash: pending.hash.clone(),
                }) {
                    tracing::warn!(hash = %pending.hash, error = %e, "Failed to drop pending transfer");
                }
            }
        }

        PageReport {
            page,
            requested: accounts.len(),
            failures,
        }
    }

    /// Pending transfers for the tracked accounts, then every recorded page
    /// in page order and tracked-account order.
    pub fn feed(&self) -> Vec<Transfer> {
        let state = self.state.lock();
        let confirmed: HashSet<&str> = state
            .pages
            .values()
            .flat_map(|p| p.values())
            .flat_map(|p| p.transfers.iter().map(|t| t.hash.as_str()))
            .collect();

        let mut feed: Vec<Transfer> = self
            .store
            .pending_transfers(Some(state.tracked.as_slice()))
            .into_iter()
            .filter(|t| !confirmed.contains(t.hash.as_str()))
            .collect();
        for page in state.pages.values() {
            for key in &state.tracked {
                if let Some(page_state) = page.get(key) {
                    feed.extend(page_state.transfers.iter().cloned());
                }
            }
        }
        feed
    }

    /// Whether the latest run left any account with more history
    pub fn has_more(&self) -> bool {
        !self.state.lock().latest_has_more().is_empty()
    }

    /// Last completed page; 0 before the first run
    pub fn current_page(&self) -> u32 {
        self.state.lock().current_page
    }

    /// Recorded state of one account's page
    pub fn page_state(&self, account: &AccountKey, page: u32) -> Option<PageState> {
        self.state
            .lock()
            .pages
            .get(&page)
            .and_then(|p| p.get(account))
            .cloned()
    }

    /// Tracked accounts in feed order
    pub fn tracked(&self) -> Vec<AccountKey> {
        self.state.lock().tracked.clone()
    }

    /// Track every account of the given list, keeping its order
    pub fn set_accounts_from(&self, accounts: &[Account]) -> bool {
        let keys: Vec<AccountKey> = accounts.iter().map(Account::key).collect();
        self.set_accounts(&keys)
    }
}
