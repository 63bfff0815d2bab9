//! Wallet service orchestration

use crate::{Result, ServiceConfig};
use neon_core::{
    Account, AccountAction, AccountKey, AccountState, AccountStore, BlockchainServiceRegistry,
    Notification,
};
use neon_session::{Navigator, SessionRequestRouter, SessionTransport};
use neon_storage::{
    AccountRepository, MigrationCoordinator, MigrationOutcome, SecretSealer, SecureStorageGateway,
    SettingsState, SettingsStorage,
};
use neon_sync::TransactionAggregator;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capabilities supplied by the host
pub struct ServiceDeps {
    /// Sealer for sensitive records
    pub sealer: Arc<dyn SecretSealer>,
    /// Chain services
    pub registry: Arc<BlockchainServiceRegistry>,
    /// dApp session transport
    pub transport: Arc<dyn SessionTransport>,
    /// UI navigation sink
    pub navigator: Arc<dyn Navigator>,
}

#[derive(Debug, Default)]
struct SessionState {
    unlocked: bool,
    selected: Option<AccountKey>,
}

impl SessionState {
    fn authenticated_address(&self) -> Option<String> {
        if self.unlocked {
            self.selected.as_ref().map(|key| key.address.clone())
        } else {
            None
        }
    }
}

/// Running wallet core
pub struct WalletService {
    config: ServiceConfig,
    gateway: Arc<SecureStorageGateway>,
    store: Arc<AccountStore>,
    repository: AccountRepository,
    settings: SettingsStorage,
    registry: Arc<BlockchainServiceRegistry>,
    router: Arc<SessionRequestRouter>,
    notifications: mpsc::UnboundedSender<Notification>,
    state: RwLock<SessionState>,
}

impl WalletService {
    /// Start the service.
    ///
    /// Resolves the data directory, restores the account catalog, runs the
    /// legacy upgrade and clears pending transfers. A failed upgrade is
    /// reported as a warning notification and retried on the next start.
    pub fn start(
        config: ServiceConfig,
        deps: ServiceDeps,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notification>)> {
        let gateway = Arc::new(SecureStorageGateway::new(
            config.root_resolver(),
            deps.sealer,
        ));
        let root = gateway.root()?;
        tracing::info!(root = %root.display(), "Starting wallet service");

        let repository = AccountRepository::new(gateway.clone());
        let store = Arc::new(AccountStore::with_state(repository.load()?));
        let (notifications, rx) = mpsc::unbounded_channel();

        match MigrationCoordinator::new(gateway.clone(), store.clone()).run() {
            Ok(MigrationOutcome::Upgraded { imported, .. }) if imported > 0 => {
                send_notification(
                    &notifications,
                    Notification::info(format!("Imported {} legacy account(s)", imported)),
                );
            }
            Ok(outcome) => tracing::debug!(?outcome, "Legacy upgrade finished"),
            Err(e) => {
                tracing::warn!(error = %e, "Legacy upgrade failed");
                send_notification(&notifications, Notification::warning(e.to_string()));
            }
        }

        store.dispatch(AccountAction::RemoveAllPendingTransfers)?;

        let router = Arc::new(SessionRequestRouter::new(
            deps.transport,
            deps.navigator,
            notifications.clone(),
            config.router_config(),
        ));

        let service = Self {
            config,
            settings: SettingsStorage::new(gateway.clone()),
            gateway,
            store,
            repository,
            registry: deps.registry,
            router,
            notifications,
            state: RwLock::new(SessionState::default()),
        };
        Ok((service, rx))
    }

    /// Apply a catalog action and persist the result.
    ///
    /// If the selected account no longer exists afterwards, the selection is
    /// cleared and the router is told there is no authenticated address.
    pub async fn dispatch(&self, action: AccountAction) -> Result<u64> {
        let persist = !matches!(
            action,
            AccountAction::AddPendingTransfer(_)
                | AccountAction::RemovePendingTransfer { .. }
                | AccountAction::RemoveAllPendingTransfers
        );
        let version = self.store.dispatch(action)?;
        if persist {
            self.repository.save(&self.store.snapshot())?;
        }

        let dropped = {
            let mut state = self.state.write();
            let gone = state
                .selected
                .as_ref()
                .is_some_and(|key| self.store.find_account(key.chain, &key.address).is_none());
            if gone {
                state.selected = None;
            }
            gone
        };
        if dropped {
            tracing::info!("Selected account removed, clearing selection");
            self.router.on_authenticated_address_changed(None).await;
        }
        Ok(version)
    }

    /// Check the password and unlock; returns whether it matched
    pub async fn unlock(&self, password: &str) -> Result<bool> {
        if !self.settings.load()?.verify_password(password)? {
            tracing::warn!("Unlock attempt with wrong password");
            return Ok(false);
        }
        let address = {
            let mut state = self.state.write();
            state.unlocked = true;
            state.authenticated_address()
        };
        tracing::info!("Wallet unlocked");
        if address.is_some() {
            self.router.on_authenticated_address_changed(address).await;
        }
        Ok(true)
    }

    /// Lock; the router loses the authenticated address
    pub async fn lock(&self) {
        self.state.write().unlocked = false;
        tracing::info!("Wallet locked");
        self.router.on_authenticated_address_changed(None).await;
    }

    /// Whether the service is unlocked
    pub fn is_unlocked(&self) -> bool {
        self.state.read().unlocked
    }

    /// Make an account the active one
    pub async fn select_account(&self, key: &AccountKey) -> Result<()> {
        let account = self
            .store
            .find_account(key.chain, &key.address)
            .ok_or_else(|| neon_core::Error::AccountNotFound(key.to_string()))?;
        let address = {
            let mut state = self.state.write();
            state.selected = Some(account.key());
            state.authenticated_address()
        };
        tracing::debug!(chain = %key.chain, "Account selected");
        if address.is_some() {
            self.router.on_authenticated_address_changed(address).await;
        }
        Ok(())
    }

    /// Selected account
    pub fn selected_account(&self) -> Option<AccountKey> {
        self.state.read().selected.clone()
    }

    /// Address the router currently treats as authenticated
    pub fn authenticated_address(&self) -> Option<String> {
        self.state.read().authenticated_address()
    }

    /// Feed over the given accounts
    pub fn aggregator_for(&self, accounts: &[AccountKey]) -> TransactionAggregator {
        let aggregator = TransactionAggregator::new(self.registry.clone(), self.store.clone());
        aggregator.set_accounts(accounts);
        aggregator
    }

    /// Session router
    pub fn router(&self) -> Arc<SessionRequestRouter> {
        self.router.clone()
    }

    /// All accounts
    pub fn accounts(&self) -> Vec<Account> {
        self.store.accounts()
    }

    /// Catalog snapshot
    pub fn snapshot(&self) -> Arc<AccountState> {
        self.store.snapshot()
    }

    /// Account store
    pub fn store(&self) -> Arc<AccountStore> {
        self.store.clone()
    }

    /// Storage gateway
    pub fn gateway(&self) -> Arc<SecureStorageGateway> {
        self.gateway.clone()
    }

    /// Stored settings
    pub fn settings(&self) -> Result<SettingsState> {
        Ok(self.settings.load()?)
    }

    /// Persist settings
    pub fn save_settings(&self, settings: &SettingsState) -> Result<()> {
        Ok(self.settings.save(settings)?)
    }

    /// Send a notification to the host
    pub fn notify(&self, notification: Notification) {
        send_notification(&self.notifications, notification);
    }

    /// Active configuration
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

fn send_notification(tx: &mpsc::UnboundedSender<Notification>, notification: Notification) {
    if tx.send(notification).is_err() {
        tracing::debug!("Notification receiver dropped");
    }
}
