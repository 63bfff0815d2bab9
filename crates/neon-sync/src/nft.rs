//! Cursor pagination over an account's NFTs

use crate::{AggregationError, Result};
use neon_core::{AccountKey, BlockchainServiceRegistry, Error, Nft, NftsQuery};
use std::sync::Arc;

/// Collects NFTs for one account, one cursor page at a time.
///
/// Chains without the NFT capability yield an empty, finished list.
pub struct NftCollector {
    registry: Arc<BlockchainServiceRegistry>,
    account: AccountKey,
    items: Vec<Nft>,
    cursor: Option<String>,
    pages: u32,
    exhausted: bool,
}

impl NftCollector {
    /// Collector for `account`
    pub fn new(registry: Arc<BlockchainServiceRegistry>, account: AccountKey) -> Self {
        Self {
            registry,
            account,
            items: Vec::new(),
            cursor: None,
            pages: 0,
            exhausted: false,
        }
    }

    /// Fetch the next page; returns how many items it added
    pub async fn fetch_next(&mut self) -> Result<usize> {
        if self.exhausted {
            return Ok(0);
        }
        let page = self.pages + 1;
        let service = self.registry.get(self.account.chain).ok_or_else(|| {
            AggregationError::PerAccountFetchFailed {
                account: self.account.clone(),
                page,
                reason: Error::ChainUnsupported(self.account.chain.to_string()).to_string(),
            }
        })?;
        let Some(nfts) = service.nft_capability() else {
            tracing::debug!(chain = %self.account.chain, "Chain has no NFT capability");
            self.exhausted = true;
            return Ok(0);
        };

        let response = nfts
            .nfts_by_address(NftsQuery {
                address: self.account.address.clone(),
                cursor: self.cursor.clone(),
            })
            .await
            .map_err(|e| AggregationError::PerAccountFetchFailed {
                account: self.account.clone(),
                page,
                reason: e.to_string(),
            })?;

        self.pages = page;
        let added = response.items.len();
        self.items.extend(response.items);
        self.exhausted = response.next_cursor.is_none();
        self.cursor = response.next_cursor;
        Ok(added)
    }

    /// Items collected so far
    pub fn items(&self) -> &[Nft] {
        &self.items
    }

    /// Whether another page may exist
    pub fn has_more(&self) -> bool {
        !self.exhausted
    }
}
