//! Per-chain service capabilities and their registry
//!
//! Chain RPC clients live outside this workspace. They plug in by
//! implementing [`BlockchainService`]; chains that can list NFTs also
//! implement [`NftDataService`] and expose it through
//! [`BlockchainService::nft_capability`].

use crate::Result;
use async_trait::async_trait;
use neon_params::ChainId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Page request for an address history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionsQuery {
    /// Address
    pub address: String,
    /// 1-based page number
    pub page: u32,
}

/// Kind of asset moved by a chain transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// Fungible token
    Token,
    /// Non-fungible token
    Nft,
}

/// Single asset movement inside a chain transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTransfer {
    /// Sender
    pub from: String,
    /// Recipient
    pub to: String,
    /// Amount as a decimal string
    pub amount: String,
    /// Token contract hash
    pub contract_hash: String,
    /// Token symbol
    pub symbol: String,
    /// Token decimals
    #[serde(default)]
    pub decimals: u8,
    /// Asset kind
    #[serde(rename = "type")]
    pub kind: TransferKind,
}

/// Transaction as reported by a chain service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTransaction {
    /// Transaction hash
    pub hash: String,
    /// Unix seconds
    pub time: i64,
    /// Asset movements
    pub transfers: Vec<ChainTransfer>,
}

/// One page of address history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsPage {
    /// Transactions on this page
    pub transactions: Vec<ChainTransaction>,
    /// Total transactions for the address
    pub total_count: u64,
    /// Page size used by the service
    pub limit: u32,
}

impl TransactionsPage {
    /// Whether pages after `page` exist
    pub fn has_more_after(&self, page: u32) -> bool {
        if self.limit == 0 {
            return false;
        }
        let total_pages = self.total_count.div_ceil(u64::from(self.limit));
        total_pages > u64::from(page)
    }
}

/// Cursor request for NFTs held by an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftsQuery {
    /// Address
    pub address: String,
    /// Cursor returned by the previous page
    pub cursor: Option<String>,
}

/// NFT held by an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nft {
    /// Collection contract hash
    pub collection_hash: String,
    /// Token id
    pub token_id: String,
    /// Collection name
    #[serde(default)]
    pub collection_name: Option<String>,
    /// Token name
    #[serde(default)]
    pub name: Option<String>,
    /// Image location
    #[serde(default)]
    pub image: Option<String>,
}

/// One cursor page of NFTs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftsPage {
    /// Items
    pub items: Vec<Nft>,
    /// Cursor for the next page, absent at the end
    pub next_cursor: Option<String>,
}

/// Optional NFT listing capability
#[async_trait]
pub trait NftDataService: Send + Sync {
    /// List NFTs held by an address
    async fn nfts_by_address(&self, query: NftsQuery) -> Result<NftsPage>;
}

/// Chain backend used by the aggregator
#[async_trait]
pub trait BlockchainService: Send + Sync {
    /// Chain served
    fn chain(&self) -> ChainId;

    /// One page of history for an address
    async fn transactions_by_address(&self, query: TransactionsQuery) -> Result<TransactionsPage>;

    /// NFT capability, when the chain supports it
    fn nft_capability(&self) -> Option<&dyn NftDataService> {
        None
    }
}

/// Lookup from chain to service
#[derive(Default, Clone)]
pub struct BlockchainServiceRegistry {
    services: HashMap<ChainId, Arc<dyn BlockchainService>>,
}

impl BlockchainServiceRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under its chain, replacing any previous one
    pub fn register(&mut self, service: Arc<dyn BlockchainService>) {
        let chain = service.chain();
        if self.services.insert(chain, service).is_some() {
            tracing::warn!(%chain, "Replaced blockchain service");
        }
    }

    /// Service for a chain
    pub fn get(&self, chain: ChainId) -> Option<Arc<dyn BlockchainService>> {
        self.services.get(&chain).cloned()
    }

    /// Whether a chain has a service
    pub fn contains(&self, chain: ChainId) -> bool {
        self.services.contains_key(&chain)
    }

    /// Registered chains, sorted
    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = self.services.keys().copied().collect();
        chains.sort();
        chains
    }
}

impl std::fmt::Debug for BlockchainServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainServiceRegistry")
            .field("chains", &self.chains())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty(ChainId);

    #[async_trait]
    impl BlockchainService for Empty {
        fn chain(&self) -> ChainId {
            self.0
        }

        async fn transactions_by_address(&self, _query: TransactionsQuery) -> Result<TransactionsPage> {
            Ok(TransactionsPage::default())
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = BlockchainServiceRegistry::new();
        registry.register(Arc::new(Empty(ChainId::NeoLegacy)));
        registry.register(Arc::new(Empty(ChainId::Neo3)));
        assert!(registry.contains(ChainId::Neo3));
        assert!(registry.get(ChainId::Ethereum).is_none());
        assert_eq!(registry.chains(), vec![ChainId::Neo3, ChainId::NeoLegacy]);
        assert!(registry.get(ChainId::Neo3).unwrap().nft_capability().is_none());
    }

    #[test]
    fn test_has_more_after() {
        let page = TransactionsPage {
            transactions: Vec::new(),
            total_count: 25,
            limit: 10,
        };
        assert!(page.has_more_after(1));
        assert!(page.has_more_after(2));
        assert!(!page.has_more_after(3));

        let unbounded = TransactionsPage::default();
        assert!(!unbounded.has_more_after(1));
    }
}
