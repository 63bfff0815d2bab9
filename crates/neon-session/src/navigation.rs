//! Navigation intents

use crate::transport::{Session, SessionRequest};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Screen currently shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Default landing screen
    Dashboard,
    /// Connect-to-dApp screen
    ConnectDapp,
    /// Request screen showing one request
    DappRequest {
        /// Request shown
        request_id: u64,
        /// Its session topic
        topic: String,
    },
    /// Any other screen
    Other(String),
}

/// Where the router wants the UI to go
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationIntent {
    /// Back to the default screen
    Default,
    /// Open the connect screen with a pairing URI
    ConnectDapp {
        /// Pairing URI from the deep link
        uri: String,
    },
    /// Show a request together with its session
    DappRequest {
        /// Request
        request: SessionRequest,
        /// Session it belongs to
        session: Session,
    },
}

impl NavigationIntent {
    /// Route the UI lands on after following the intent
    pub fn route(&self) -> Route {
        match self {
            NavigationIntent::Default => Route::Dashboard,
            NavigationIntent::ConnectDapp { .. } => Route::ConnectDapp,
            NavigationIntent::DappRequest { request, .. } => Route::DappRequest {
                request_id: request.id,
                topic: request.topic.clone(),
            },
        }
    }
}

/// Navigation sink shared by deep-link and request handling
pub trait Navigator: Send + Sync {
    /// Screen currently shown
    fn current_route(&self) -> Route;

    /// Emit an intent; the last one emitted wins
    fn navigate(&self, intent: NavigationIntent);
}

/// Navigator that tracks the route and forwards intents over a channel
pub struct ChannelNavigator {
    route: Mutex<Route>,
    intents: mpsc::UnboundedSender<NavigationIntent>,
}

impl ChannelNavigator {
    /// Navigator starting on the dashboard, plus the intent receiver
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NavigationIntent>) {
        let (intents, rx) = mpsc::unbounded_channel();
        (
            Self {
                route: Mutex::new(Route::Dashboard),
                intents,
            },
            rx,
        )
    }

    /// Record a route change made by the UI itself
    pub fn set_route(&self, route: Route) {
        *self.route.lock() = route;
    }
}

impl Navigator for ChannelNavigator {
    fn current_route(&self) -> Route {
        self.route.lock().clone()
    }

    fn navigate(&self, intent: NavigationIntent) {
        *self.route.lock() = intent.route();
        if self.intents.send(intent).is_err() {
            tracing::debug!("Navigation receiver dropped");
        }
    }
}
