//! Transfers shown in the activity feed

use crate::account::{Account, AccountKey};
use serde::{Deserialize, Serialize};

/// Direction relative to the feed account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    /// Funds arrived at the account
    Incoming,
    /// Funds left the account
    Outgoing,
    /// Account sent to itself
    SelfTransfer,
}

/// Asset moved by a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Token contract hash or address
    pub hash: String,
    /// Ticker
    pub symbol: String,
    /// Token decimals
    #[serde(default)]
    pub decimals: u8,
}

/// One movement of an asset, confirmed or pending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    /// Unix seconds
    pub time: i64,
    /// Transaction hash, dedup key against pending entries
    pub hash: String,
    /// Account whose history produced the transfer
    pub account: AccountKey,
    /// Known account on the other side, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<AccountKey>,
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Asset
    pub asset: Asset,
    /// Amount as a decimal string
    pub amount: String,
    /// Direction relative to `account`
    pub direction: TransferDirection,
    /// Submitted locally and not yet confirmed
    #[serde(default)]
    pub pending: bool,
}

impl Transfer {
    /// Direction of a from/to pair relative to `account`
    pub fn direction_for(account: &AccountKey, from: &str, to: &str) -> TransferDirection {
        let sent = account.matches(account.chain, from);
        let received = account.matches(account.chain, to);
        match (sent, received) {
            (true, true) => TransferDirection::SelfTransfer,
            (true, false) => TransferDirection::Outgoing,
            _ => TransferDirection::Incoming,
        }
    }

    /// Resolve the counterparty against the known account list
    pub fn resolve_counterparty(&mut self, known: &[Account]) {
        let other = match self.direction {
            TransferDirection::Outgoing => self.to.as_str(),
            TransferDirection::Incoming => self.from.as_str(),
            TransferDirection::SelfTransfer => self.account.address.as_str(),
        };
        self.counterparty = known
            .iter()
            .find(|a| a.chain == self.account.chain && a.has_address(other))
            .map(Account::key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neon_params::ChainId;

    fn transfer(from: &str, to: &str) -> Transfer {
        let account = AccountKey::new(ChainId::Neo3, "NA");
        Transfer {
            time: 1,
            hash: "0x01".to_string(),
            direction: Transfer::direction_for(&account, from, to),
            account,
            counterparty: None,
            from: from.to_string(),
            to: to.to_string(),
            asset: Asset {
                hash: "0xd2a4".to_string(),
                symbol: "GAS".to_string(),
                decimals: 8,
            },
            amount: "1".to_string(),
            pending: false,
        }
    }

    #[test]
    fn test_direction() {
        assert_eq!(transfer("NA", "NB").direction, TransferDirection::Outgoing);
        assert_eq!(transfer("NB", "NA").direction, TransferDirection::Incoming);
        assert_eq!(transfer("NA", "NA").direction, TransferDirection::SelfTransfer);
    }

    #[test]
    fn test_counterparty_is_other_side() {
        let known = vec![
            Account::new(ChainId::Neo3, "NA", "w", "a"),
            Account::new(ChainId::Neo3, "NB", "w", "b"),
        ];
        let mut t = transfer("NA", "NB");
        t.resolve_counterparty(&known);
        assert_eq!(t.counterparty, Some(AccountKey::new(ChainId::Neo3, "NB")));

        let mut t = transfer("NZ", "NA");
        t.resolve_counterparty(&known);
        assert_eq!(t.counterparty, None);
    }
}
