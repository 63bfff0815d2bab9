//! dApp session arbitration for Neon wallet
//!
//! Routes deep links and inbound session requests to navigation intents,
//! and tears down sessions connected under an address that is no longer
//! the authenticated one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod deeplink;
pub mod error;
pub mod navigation;
pub mod router;
pub mod transport;

pub use deeplink::decode_deep_link;
pub use error::{Result, SessionError};
pub use navigation::{ChannelNavigator, NavigationIntent, Navigator, Route};
pub use router::{
    BlockReason, DeepLinkState, RequestPhase, RouterConfig, RouterEvent, RoutingDecision,
    SessionRequestRouter, TeardownReport, LOGIN_REQUIRED_MESSAGE,
};
pub use transport::{PeerMetadata, Session, SessionRequest, SessionTransport, TransportStatus};
