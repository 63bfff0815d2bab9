//! Wallets and accounts

use neon_params::ChainId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wallet kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletType {
    /// Mnemonic backed wallet
    Standard,
    /// Addresses only, cannot sign
    WatchOnly,
    /// Imported from the pre-multichain NEP-6 record
    Legacy,
    /// Keys live on an external device
    Hardware,
}

impl WalletType {
    /// Whether the wallet may hold local key material
    pub fn stores_keys(&self) -> bool {
        !matches!(self, WalletType::Hardware | WalletType::WatchOnly)
    }
}

/// Account color tag for visual identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    /// Default green
    #[default]
    Green,
    /// Blue
    Blue,
    /// Purple
    Purple,
    /// Magenta
    Magenta,
    /// Orange
    Orange,
    /// Yellow
    Yellow,
    /// Gray
    Gray,
}

impl ColorTag {
    /// Hex color code
    pub fn hex_color(&self) -> &'static str {
        match self {
            ColorTag::Green => "#00DF8F",
            ColorTag::Blue => "#3B82F6",
            ColorTag::Purple => "#8B5CF6",
            ColorTag::Magenta => "#E9265C",
            ColorTag::Orange => "#F97316",
            ColorTag::Yellow => "#EAB308",
            ColorTag::Gray => "#6B7280",
        }
    }
}

/// A wallet groups accounts and optionally carries an encrypted mnemonic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Wallet id
    pub id: String,
    /// Display name
    pub name: String,
    /// Wallet kind
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    /// Mnemonic sealed by the storage gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_mnemonic: Option<String>,
}

impl Wallet {
    /// Create a wallet without key material
    pub fn new(id: impl Into<String>, name: impl Into<String>, wallet_type: WalletType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            wallet_type,
            encrypted_mnemonic: None,
        }
    }
}

/// Identity of an account: address unique within a chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountKey {
    /// Chain
    pub chain: ChainId,
    /// Address on the chain
    pub address: String,
}

impl AccountKey {
    /// Create an account key
    pub fn new(chain: ChainId, address: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
        }
    }

    /// Compare against a raw address using the chain's address rules
    pub fn matches(&self, chain: ChainId, address: &str) -> bool {
        self.chain == chain && addresses_equal(chain, &self.address, address)
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.address)
    }
}

/// Address equality; hex chains compare case-insensitively
pub fn addresses_equal(chain: ChainId, a: &str, b: &str) -> bool {
    if chain.case_insensitive_addresses() {
        a.eq_ignore_ascii_case(b)
    } else {
        a == b
    }
}

/// Account within a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Address
    pub address: String,
    /// Chain the address lives on
    #[serde(rename = "blockchain")]
    pub chain: ChainId,
    /// Owning wallet
    #[serde(rename = "idWallet")]
    pub wallet_id: String,
    /// Display name
    pub name: String,
    /// Color tag
    #[serde(default, rename = "backgroundColor")]
    pub color: ColorTag,
    /// Position within the wallet; gaps allowed
    #[serde(default)]
    pub order: u32,
    /// Private key sealed by the storage gateway
    #[serde(default, rename = "encryptedKey", skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<String>,
}

impl Account {
    /// Create an account with default presentation
    pub fn new(
        chain: ChainId,
        address: impl Into<String>,
        wallet_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            chain,
            wallet_id: wallet_id.into(),
            name: name.into(),
            color: ColorTag::default(),
            order: 0,
            encrypted_key: None,
        }
    }

    /// Identity key
    pub fn key(&self) -> AccountKey {
        AccountKey::new(self.chain, self.address.clone())
    }

    /// Compare against a raw address on this account's chain
    pub fn has_address(&self, address: &str) -> bool {
        addresses_equal(self.chain, &self.address, address)
    }
}
