//! Session request router
//!
//! Two independent state machines share one navigation sink:
//!
//! - deep links: `Idle -> Pending -> (Blocked(NoAccount) | NavigatedToConnect)`
//! - requests: `Idle -> Pending -> Displayed -> (Resolved | TimedOut)`
//!
//! The router keeps only identifiers (request id, topic) and resolves them
//! against the transport snapshot every time it decides.

use crate::deeplink::decode_deep_link;
use crate::navigation::{NavigationIntent, Navigator, Route};
use crate::transport::{Session, SessionTransport, TransportStatus};
use crate::SessionError;
use futures::future::join_all;
use neon_core::Notification;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Shown when a deep link arrives before login
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please login before connecting to a dApp.";

/// Router timing
#[derive(Debug, Clone, Copy)]
pub struct RouterConfig {
    /// Wait before deciding on request changes
    pub settle_delay: Duration,
    /// Displayed requests older than this are reported as timed out
    pub request_ttl: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            request_ttl: Duration::from_secs(300),
        }
    }
}

/// Why a deep link is held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// No authenticated account
    NoAccount,
}

/// Deep-link state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLinkState {
    /// Nothing held
    Idle,
    /// Link received, not evaluated yet
    Pending {
        /// Raw link
        link: String,
    },
    /// Link held until an account is available
    Blocked {
        /// Raw link
        link: String,
        /// Reason
        reason: BlockReason,
    },
    /// Connect screen opened for the decoded URI
    NavigatedToConnect {
        /// Pairing URI
        uri: String,
    },
}

/// Request state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPhase {
    /// No request known
    Idle,
    /// Requests present, waiting for the settle delay
    Pending,
    /// Request screen opened
    Displayed {
        /// Request id
        request_id: u64,
        /// When the screen was opened
        since: Instant,
    },
    /// Request left the pending list in time
    Resolved {
        /// Request id
        request_id: u64,
    },
    /// Request left the pending list after the TTL
    TimedOut {
        /// Request id
        request_id: u64,
    },
}

/// What a routing pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Transport not ready
    TransportNotReady,
    /// No pending requests
    NothingPending,
    /// Request screen already shows a pending request
    AlreadyDisplayed {
        /// Request id
        request_id: u64,
    },
    /// Shown request is gone; back to the default screen
    ReturnedToDefault {
        /// Request id
        request_id: u64,
    },
    /// Oldest request has no session and is not surfaced
    NoSession {
        /// Request id
        request_id: u64,
    },
    /// Request screen opened
    Navigated {
        /// Request id
        request_id: u64,
    },
}

/// Result of an address-change teardown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Topics disconnected
    pub disconnected: Vec<String>,
    /// Disconnects that failed; not retried
    pub failed: Vec<SessionError>,
}

/// Events consumed by [`SessionRequestRouter::spawn`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterEvent {
    /// Deep link delivered
    DeepLink(String),
    /// Authenticated address changed
    AddressChanged(Option<String>),
    /// Transport request list changed
    RequestsChanged,
}

/// Arbitrates deep links, session requests and address changes
pub struct SessionRequestRouter {
    transport: Arc<dyn SessionTransport>,
    navigator: Arc<dyn Navigator>,
    notifications: mpsc::UnboundedSender<Notification>,
    config: RouterConfig,
    address: Mutex<Option<String>>,
    deep_link: Mutex<DeepLinkState>,
    phase: Mutex<RequestPhase>,
    teardown: tokio::sync::RwLock<()>,
}

impl SessionRequestRouter {
    /// Create a router
    pub fn new(
        transport: Arc<dyn SessionTransport>,
        navigator: Arc<dyn Navigator>,
        notifications: mpsc::UnboundedSender<Notification>,
        config: RouterConfig,
    ) -> Self {
        Self {
            transport,
            navigator,
            notifications,
            config,
            address: Mutex::new(None),
            deep_link: Mutex::new(DeepLinkState::Idle),
            phase: Mutex::new(RequestPhase::Idle),
            teardown: tokio::sync::RwLock::new(()),
        }
    }

    /// Accept a deep link; it replaces any link still held
    pub fn handle_deep_link(&self, link: &str) {
        tracing::debug!("Deep link received");
        *self.deep_link.lock() = DeepLinkState::Pending {
            link: link.to_string(),
        };
        self.evaluate_deep_link();
    }

    fn evaluate_deep_link(&self) {
        let authenticated = self.address.lock().is_some();
        let mut state = self.deep_link.lock();
        let (link, already_blocked) = match &*state {
            DeepLinkState::Pending { link } => (link.clone(), false),
            DeepLinkState::Blocked { link, .. } => (link.clone(), true),
            _ => return,
        };

        if !authenticated {
            if !already_blocked {
                *state = DeepLinkState::Blocked {
                    link,
                    reason: BlockReason::NoAccount,
                };
                drop(state);
                self.notify(Notification::info(LOGIN_REQUIRED_MESSAGE));
            }
            return;
        }

        match decode_deep_link(&link) {
            Some(uri) => {
                *state = DeepLinkState::NavigatedToConnect { uri: uri.clone() };
                drop(state);
                tracing::info!("Opening connect screen from deep link");
                self.navigator.navigate(NavigationIntent::ConnectDapp { uri });
            }
            None => {
                *state = DeepLinkState::Idle;
                tracing::warn!("Deep link has no uri parameter, dropping it");
            }
        }
    }

    /// Record a new authenticated address.
    ///
    /// When it changes to `Some(address)`, every session connected under a
    /// different address is disconnected concurrently. A held deep link is
    /// re-evaluated afterwards.
    pub async fn on_authenticated_address_changed(&self, address: Option<String>) -> TeardownReport {
        let _gate = self.teardown.write().await;
        let previous = std::mem::replace(&mut *self.address.lock(), address.clone());

        let mut report = TeardownReport::default();
        if let Some(current) = address.as_deref() {
            if previous.as_deref() != Some(current) {
                report = self.disconnect_mismatched(current).await;
            }
        }
        drop(_gate);

        self.evaluate_deep_link();
        report
    }

    async fn disconnect_mismatched(&self, current: &str) -> TeardownReport {
        let stale: Vec<Session> = self
            .transport
            .sessions()
            .into_iter()
            .filter(|session| !session_matches(session, current))
            .collect();
        if stale.is_empty() {
            return TeardownReport::default();
        }
        tracing::info!(sessions = stale.len(), "Disconnecting sessions of previous address");

        let outcomes = join_all(stale.iter().map(|session| async move {
            let result = self.transport.disconnect(session).await;
            (session.topic.clone(), result)
        }))
        .await;

        let mut report = TeardownReport::default();
        for (topic, result) in outcomes {
            match result {
                Ok(()) => report.disconnected.push(topic),
                Err(e) => {
                    let error = SessionError::DisconnectFailed {
                        topic: topic.clone(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(%topic, error = %error, "Session disconnect failed");
                    report.failed.push(error);
                }
            }
        }
        report
    }

    /// Sessions after any running teardown has finished
    pub async fn active_sessions(&self) -> Vec<Session> {
        let _gate = self.teardown.read().await;
        self.transport.sessions()
    }

    /// Schedule a routing pass for a changed request list
    pub fn on_requests_changed(self: &Arc<Self>) -> JoinHandle<RoutingDecision> {
        {
            let mut phase = self.phase.lock();
            if matches!(*phase, RequestPhase::Idle) {
                *phase = RequestPhase::Pending;
            }
        }
        let router = Arc::clone(self);
        tokio::spawn(async move { router.route_pending_requests().await })
    }

    /// Wait for the settle delay, then decide against the current snapshot
    pub async fn route_pending_requests(&self) -> RoutingDecision {
        tokio::time::sleep(self.config.settle_delay).await;

        if self.transport.status() != TransportStatus::Ready {
            tracing::debug!("Transport not ready, skipping request routing");
            return RoutingDecision::TransportNotReady;
        }
        let requests = self.transport.requests();

        if let Route::DappRequest { request_id, .. } = self.navigator.current_route() {
            if requests.iter().any(|r| r.id == request_id) {
                return RoutingDecision::AlreadyDisplayed { request_id };
            }
            self.finish_request(request_id);
            self.navigator.navigate(NavigationIntent::Default);
            return RoutingDecision::ReturnedToDefault { request_id };
        }

        let Some(request) = requests.iter().min_by_key(|r| (r.timestamp, r.id)).cloned() else {
            let mut phase = self.phase.lock();
            if matches!(*phase, RequestPhase::Pending) {
                *phase = RequestPhase::Idle;
            }
            return RoutingDecision::NothingPending;
        };
        let request_id = request.id;

        let Some(session) = self
            .transport
            .sessions()
            .into_iter()
            .find(|s| s.topic == request.topic)
        else {
            tracing::warn!(request_id, topic = %request.topic, "Request has no session, not surfacing it");
            return RoutingDecision::NoSession { request_id };
        };

        *self.phase.lock() = RequestPhase::Displayed {
            request_id,
            since: Instant::now(),
        };
        tracing::info!(request_id, method = %request.method, "Opening request screen");
        self.navigator
            .navigate(NavigationIntent::DappRequest { request, session });
        RoutingDecision::Navigated { request_id }
    }

    fn finish_request(&self, request_id: u64) {
        let mut phase = self.phase.lock();
        let timed_out = match &*phase {
            RequestPhase::Displayed {
                request_id: shown,
                since,
            } if *shown == request_id => since.elapsed() >= self.config.request_ttl,
            _ => false,
        };
        *phase = if timed_out {
            tracing::info!(request_id, "Request timed out");
            RequestPhase::TimedOut { request_id }
        } else {
            tracing::debug!(request_id, "Request resolved");
            RequestPhase::Resolved { request_id }
        };
    }

    /// Current deep-link state
    pub fn deep_link_state(&self) -> DeepLinkState {
        self.deep_link.lock().clone()
    }

    /// Current request state
    pub fn request_phase(&self) -> RequestPhase {
        self.phase.lock().clone()
    }

    /// Authenticated address as last reported
    pub fn authenticated_address(&self) -> Option<String> {
        self.address.lock().clone()
    }

    /// Drive the router from an event channel.
    ///
    /// Deep links are handled inline. Address changes are applied one at a
    /// time, in arrival order, by a dedicated worker. Request changes run as
    /// their own tasks. The handle completes once the channel closes and
    /// every queued address change has been applied.
    pub fn spawn(self: Arc<Self>, mut events: mpsc::Receiver<RouterEvent>) -> JoinHandle<()> {
        let (addresses, mut queued) = mpsc::unbounded_channel::<Option<String>>();
        let router = Arc::clone(&self);
        let address_worker = tokio::spawn(async move {
            while let Some(address) = queued.recv().await {
                router.on_authenticated_address_changed(address).await;
            }
        });

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    RouterEvent::DeepLink(link) => self.handle_deep_link(&link),
                    RouterEvent::AddressChanged(address) => {
                        if addresses.send(address).is_err() {
                            tracing::warn!("Address worker stopped, dropping address change");
                        }
                    }
                    RouterEvent::RequestsChanged => {
                        self.on_requests_changed();
                    }
                }
            }
            drop(addresses);
            if let Err(e) = address_worker.await {
                tracing::warn!(error = %e, "Address worker failed");
            }
            tracing::debug!("Router event loop ended");
        })
    }

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            tracing::debug!("Notification receiver dropped");
        }
    }
}

fn session_matches(session: &Session, address: &str) -> bool {
    match session.connected_address() {
        Some(connected) if connected.starts_with("0x") => connected.eq_ignore_ascii_case(address),
        Some(connected) => connected == address,
        None => false,
    }
}
