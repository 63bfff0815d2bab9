//! Network selection

use crate::{ChainId, Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Network type enumeration
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Mainnet
    #[default]
    Mainnet,
    /// Testnet
    Testnet,
    /// User supplied RPC endpoints
    Custom,
}

impl NetworkType {
    /// Lowercase name as persisted in settings
    pub fn name(&self) -> &'static str {
        match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Custom => "custom",
        }
    }
}

impl FromStr for NetworkType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(NetworkType::Mainnet),
            "testnet" => Ok(NetworkType::Testnet),
            "custom" => Ok(NetworkType::Custom),
            _ => Err(Error::InvalidNetwork(s.to_string())),
        }
    }
}

/// Network configuration for one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    /// Chain this network belongs to
    pub chain: ChainId,
    /// Network type
    pub network_type: NetworkType,
}

impl Network {
    /// Create a network description
    pub const fn new(chain: ChainId, network_type: NetworkType) -> Self {
        Self {
            chain,
            network_type,
        }
    }

    /// CAIP-2 chain reference (`namespace:reference`)
    pub fn caip2(&self) -> String {
        let reference = match (self.chain, self.network_type) {
            (ChainId::Ethereum, NetworkType::Mainnet) => "1",
            (ChainId::Ethereum, _) => "11155111",
            (ChainId::NeoX, NetworkType::Mainnet) => "47763",
            (ChainId::NeoX, _) => "12227332",
            (_, network_type) => network_type.name(),
        };
        format!("{}:{}", self.chain.caip_namespace(), reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caip2_names() {
        assert_eq!(
            Network::new(ChainId::Neo3, NetworkType::Testnet).caip2(),
            "neo3:testnet"
        );
        assert_eq!(
            Network::new(ChainId::Ethereum, NetworkType::Mainnet).caip2(),
            "eip155:1"
        );
    }

    #[test]
    fn test_network_type_parse() {
        assert_eq!("MainNet".parse::<NetworkType>().unwrap(), NetworkType::Mainnet);
        assert!("devnet".parse::<NetworkType>().is_err());
        assert_eq!(NetworkType::default(), NetworkType::Mainnet);
    }
}
