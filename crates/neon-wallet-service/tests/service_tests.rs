//! Startup and account selection against a temporary data directory

use async_trait::async_trait;
use neon_core::{
    Account, AccountAction, AccountKey, BlockchainServiceRegistry, ChainId, NotificationLevel,
    Wallet, WalletType,
};
use neon_session::{
    ChannelNavigator, DeepLinkState, NavigationIntent, PeerMetadata, Session, SessionRequest,
    SessionTransport, TransportStatus,
};
use neon_storage::{
    EncryptionAlgorithm, FixedRoot, MasterKey, MasterKeySealer, SecretSealer,
    SecureStorageGateway,
};
use neon_wallet_service::{ServiceConfig, ServiceDeps, WalletService};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const X: &str = "NbnjKGMBJzJ6j5PHeYhjJDaQ5Vy5UYu4Fv";
const Y: &str = "NQCLAHuu4umnR99KB5m7U8ppJFtWqhw6DS";

#[derive(Default)]
struct StaticTransport {
    sessions: Mutex<Vec<Session>>,
    disconnected: Mutex<Vec<String>>,
}

#[async_trait]
impl SessionTransport for StaticTransport {
    fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().clone()
    }

    fn requests(&self) -> Vec<SessionRequest> {
        Vec::new()
    }

    async fn disconnect(&self, session: &Session) -> neon_session::Result<()> {
        self.disconnected.lock().unwrap().push(session.topic.clone());
        self.sessions
            .lock()
            .unwrap()
            .retain(|s| s.topic != session.topic);
        Ok(())
    }

    fn status(&self) -> TransportStatus {
        TransportStatus::Ready
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    sealer: Arc<dyn SecretSealer>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            sealer: Arc::new(MasterKeySealer::new(MasterKey::generate(
                EncryptionAlgorithm::ChaCha20Poly1305,
            ))),
        }
    }

    fn config(&self) -> ServiceConfig {
        ServiceConfig {
            data_dir: Some(self.dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    fn gateway(&self) -> SecureStorageGateway {
        SecureStorageGateway::new(
            Arc::new(FixedRoot(self.dir.path().to_path_buf())),
            self.sealer.clone(),
        )
    }

    fn start_with(
        &self,
        transport: Arc<StaticTransport>,
    ) -> (
        WalletService,
        mpsc::UnboundedReceiver<neon_core::Notification>,
        mpsc::UnboundedReceiver<NavigationIntent>,
    ) {
        let (navigator, intents) = ChannelNavigator::new();
        let (service, notifications) = WalletService::start(
            self.config(),
            ServiceDeps {
                sealer: self.sealer.clone(),
                registry: Arc::new(BlockchainServiceRegistry::new()),
                transport,
                navigator: Arc::new(navigator),
            },
        )
        .unwrap();
        (service, notifications, intents)
    }

    fn start(&self) -> (WalletService, mpsc::UnboundedReceiver<neon_core::Notification>) {
        let (service, notifications, _) = self.start_with(Arc::new(StaticTransport::default()));
        (service, notifications)
    }
}

async fn add_wallet(service: &WalletService) {
    service
        .dispatch(AccountAction::AddWallet(Wallet::new(
            "w1",
            "Main",
            WalletType::Standard,
        )))
        .await
        .unwrap();
    for (address, name) in [(X, "Spending"), (Y, "Savings")] {
        service
            .dispatch(AccountAction::AddAccount(Account::new(
                ChainId::Neo3,
                address,
                "w1",
                name,
            )))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_catalog_survives_restart() {
    let fixture = Fixture::new();
    {
        let (service, mut notifications) = fixture.start();
        assert!(service.accounts().is_empty());
        assert!(notifications.try_recv().is_err());
        add_wallet(&service).await;
    }

    let (service, _) = fixture.start();
    let accounts = service.accounts();
    assert_eq!(accounts.len(), 2);
    assert_eq!(service.snapshot().wallets.len(), 1);
    assert!(service.store().does_account_exist(Y));
}

#[tokio::test]
async fn test_legacy_wallet_is_imported_on_start() {
    let fixture = Fixture::new();
    fixture
        .gateway()
        .write(
            "userWallet",
            &json!({
                "name": "userWallet",
                "accounts": [
                    {"address": "AK2nJJpJr6o664CWJKi1QRXjqeic2zRp8y", "label": "savings", "isDefault": false, "key": "6PYKey1"},
                    {"address": "AQVh2pG732YvtNaxEGkQUei3YA4cvo7d2i", "label": "main", "isDefault": true, "key": "6PYKey2"}
                ]
            }),
            false,
        )
        .unwrap();

    let (service, mut notifications) = fixture.start();

    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.level, NotificationLevel::Info);
    let accounts = service.accounts();
    assert_eq!(accounts.len(), 2);
    assert!(accounts.iter().all(|a| a.chain == ChainId::NeoLegacy));
    assert_eq!(service.snapshot().wallets[0].wallet_type, WalletType::Legacy);

    // Second start does not import again
    drop(service);
    let (service, mut notifications) = fixture.start();
    assert!(notifications.try_recv().is_err());
    assert_eq!(service.accounts().len(), 2);
}

#[tokio::test]
async fn test_failed_upgrade_warns_and_starts() {
    let fixture = Fixture::new();
    fixture
        .gateway()
        .write("userWallet", &json!({"accounts": "not-a-list"}), false)
        .unwrap();

    let (service, mut notifications) = fixture.start();

    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.level, NotificationLevel::Warning);
    assert!(notification
        .message
        .starts_with("Error upgrading legacy wallet:"));
    assert!(service.accounts().is_empty());
    assert!(fixture.gateway().read("migration-state").unwrap().is_none());
}

#[tokio::test]
async fn test_unlock_and_select_feed_router_address() {
    let fixture = Fixture::new();
    let transport = Arc::new(StaticTransport::default());
    transport.sessions.lock().unwrap().push(Session {
        topic: "old".to_string(),
        peer: PeerMetadata::default(),
        accounts: vec![format!("neo3:mainnet:{X}")],
    });
    let (service, _notifications, _intents) = fixture.start_with(transport.clone());
    add_wallet(&service).await;

    let mut settings = service.settings().unwrap();
    settings.set_password("correct horse").unwrap();
    service.save_settings(&settings).unwrap();

    service
        .select_account(&AccountKey::new(ChainId::Neo3, Y))
        .await
        .unwrap();
    assert_eq!(service.authenticated_address(), None);
    assert_eq!(service.router().authenticated_address(), None);

    assert!(!service.unlock("wrong password").await.unwrap());
    assert!(!service.is_unlocked());

    assert!(service.unlock("correct horse").await.unwrap());
    assert_eq!(service.router().authenticated_address().as_deref(), Some(Y));
    assert_eq!(*transport.disconnected.lock().unwrap(), vec!["old".to_string()]);

    service.lock().await;
    assert_eq!(service.router().authenticated_address(), None);
}

#[tokio::test]
async fn test_select_unknown_account_fails() {
    let fixture = Fixture::new();
    let (service, _) = fixture.start();

    let err = service
        .select_account(&AccountKey::new(ChainId::Neo3, X))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Account not found"));
}

#[tokio::test]
async fn test_removing_selected_account_clears_selection() {
    let fixture = Fixture::new();
    let (service, _) = fixture.start();
    add_wallet(&service).await;
    service.unlock("").await.unwrap();

    let key = AccountKey::new(ChainId::Neo3, X);
    service.select_account(&key).await.unwrap();
    assert_eq!(service.router().authenticated_address().as_deref(), Some(X));

    service
        .dispatch(AccountAction::RemoveAccount(key))
        .await
        .unwrap();

    assert_eq!(service.selected_account(), None);
    assert_eq!(service.router().authenticated_address(), None);
}

#[tokio::test]
async fn test_deep_link_waits_for_unlock() {
    let fixture = Fixture::new();
    let (service, mut notifications, mut intents) =
        fixture.start_with(Arc::new(StaticTransport::default()));
    add_wallet(&service).await;

    service
        .router()
        .handle_deep_link("neon3://?uri=wc%3Aabc%402");
    assert!(matches!(
        service.router().deep_link_state(),
        DeepLinkState::Blocked { .. }
    ));
    assert_eq!(
        notifications.try_recv().unwrap().level,
        NotificationLevel::Info
    );

    service
        .select_account(&AccountKey::new(ChainId::Neo3, X))
        .await
        .unwrap();
    service.unlock("").await.unwrap();

    assert_eq!(
        intents.try_recv().unwrap(),
        NavigationIntent::ConnectDapp {
            uri: "wc:abc@2".to_string()
        }
    );
}

#[tokio::test]
async fn test_aggregator_tracks_requested_accounts() {
    let fixture = Fixture::new();
    let (service, _) = fixture.start();
    add_wallet(&service).await;

    let keys = vec![AccountKey::new(ChainId::Neo3, X)];
    let aggregator = service.aggregator_for(&keys);
    assert_eq!(aggregator.tracked(), keys);
}

#[tokio::test]
async fn test_notify_after_receiver_dropped_is_ignored() {
    let fixture = Fixture::new();
    let (service, notifications) = fixture.start();
    drop(notifications);

    service.notify(neon_core::Notification::info("still running"));
    add_wallet(&service).await;
    assert_eq!(service.accounts().len(), 2);
}
