//! Chain identifiers

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Blockchain backend an account lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChainId {
    /// Neo N3
    Neo3,
    /// Neo Legacy (Neo 2)
    NeoLegacy,
    /// Ethereum mainnet / testnets
    Ethereum,
    /// Neo X (EVM sidechain)
    NeoX,
}

impl ChainId {
    /// Stable identifier used in storage and logs
    pub fn name(&self) -> &'static str {
        match self {
            ChainId::Neo3 => "neo3",
            ChainId::NeoLegacy => "neoLegacy",
            ChainId::Ethereum => "ethereum",
            ChainId::NeoX => "neox",
        }
    }

    /// Human readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            ChainId::Neo3 => "Neo N3",
            ChainId::NeoLegacy => "Neo Legacy",
            ChainId::Ethereum => "Ethereum",
            ChainId::NeoX => "Neo X",
        }
    }

    /// CAIP-2 namespace used by dApp sessions
    pub fn caip_namespace(&self) -> &'static str {
        match self {
            ChainId::Neo3 => "neo3",
            ChainId::NeoLegacy => "neo2",
            ChainId::Ethereum | ChainId::NeoX => "eip155",
        }
    }

    /// Whether addresses on this chain compare case-insensitively (hex addresses)
    pub fn case_insensitive_addresses(&self) -> bool {
        matches!(self, ChainId::Ethereum | ChainId::NeoX)
    }

    /// All supported chains
    pub fn all() -> &'static [ChainId] {
        &[
            ChainId::Neo3,
            ChainId::NeoLegacy,
            ChainId::Ethereum,
            ChainId::NeoX,
        ]
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChainId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ChainId::all()
            .iter()
            .copied()
            .find(|chain| chain.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidChain(s.to_string()))
    }
}

/// Extract the account address from a CAIP-10 identifier (`namespace:reference:address`).
pub fn address_from_caip10(account_id: &str) -> Result<&str> {
    let mut parts = account_id.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(ns), Some(reference), Some(address))
            if !ns.is_empty() && !reference.is_empty() && !address.is_empty() =>
        {
            Ok(address)
        }
        _ => Err(Error::InvalidAccountId(account_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_round_trip_by_name() {
        for chain in ChainId::all() {
            assert_eq!(chain.name().parse::<ChainId>().unwrap(), *chain);
        }
        assert!("bitcoin".parse::<ChainId>().is_err());
    }

    #[test]
    fn test_chain_serde_names() {
        let json = serde_json::to_string(&ChainId::NeoLegacy).unwrap();
        assert_eq!(json, "\"neoLegacy\"");
        let chain: ChainId = serde_json::from_str("\"neo3\"").unwrap();
        assert_eq!(chain, ChainId::Neo3);
    }

    #[test]
    fn test_address_from_caip10() {
        assert_eq!(
            address_from_caip10("neo3:testnet:NbnjKGMBJzJ6j5PHeYhjJDaQ5Vy5UYu4Fv").unwrap(),
            "NbnjKGMBJzJ6j5PHeYhjJDaQ5Vy5UYu4Fv"
        );
        assert!(address_from_caip10("neo3:testnet").is_err());
        assert!(address_from_caip10("::addr").is_err());
    }
}
