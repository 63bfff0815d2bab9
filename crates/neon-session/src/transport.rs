//! Session transport capability
//!
//! The relay protocol lives outside this crate. The router only reads the
//! transport's current snapshot and asks it to disconnect sessions.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// dApp metadata announced during pairing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMetadata {
    /// dApp name
    pub name: String,
    /// dApp origin
    pub url: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Icon URLs
    #[serde(default)]
    pub icons: Vec<String>,
}

/// Established session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Relay topic, unique per session
    pub topic: String,
    /// Peer metadata
    pub peer: PeerMetadata,
    /// CAIP-10 accounts approved for the session
    pub accounts: Vec<String>,
}

impl Session {
    /// Address the session was approved for
    pub fn connected_address(&self) -> Option<&str> {
        self.accounts
            .first()
            .and_then(|id| neon_params::chain::address_from_caip10(id).ok())
    }
}

/// Pending request from a dApp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Request id
    pub id: u64,
    /// Topic of the session that sent it
    pub topic: String,
    /// RPC method
    pub method: String,
    /// RPC params
    #[serde(default)]
    pub params: serde_json::Value,
    /// Unix milliseconds when received
    pub timestamp: i64,
}

/// Transport readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStatus {
    /// Still connecting to the relay
    Initializing,
    /// Sessions and requests are authoritative
    Ready,
    /// Relay unreachable
    Failed,
}

/// Live view of sessions and requests
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Current sessions
    fn sessions(&self) -> Vec<Session>;

    /// Current pending requests
    fn requests(&self) -> Vec<SessionRequest>;

    /// Disconnect a session
    async fn disconnect(&self, session: &Session) -> Result<()>;

    /// Readiness
    fn status(&self) -> TransportStatus;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_address_from_caip10() {
        let session = Session {
            topic: "t".to_string(),
            peer: PeerMetadata::default(),
            accounts: vec!["neo3:mainnet:NbnjKGMBJzJ6j5PHeYhjJDaQ5Vy5UYu4Fv".to_string()],
        };
        assert_eq!(
            session.connected_address(),
            Some("NbnjKGMBJzJ6j5PHeYhjJDaQ5Vy5UYu4Fv")
        );

        let empty = Session {
            accounts: Vec::new(),
            ..session
        };
        assert_eq!(empty.connected_address(), None);
    }
}
