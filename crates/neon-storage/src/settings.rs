//! Application settings record

use crate::gateway::SecureStorageGateway;
use crate::security::AppPassphrase;
use crate::Result;
use neon_params::NetworkType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Settings record key
pub const SETTINGS_KEY: &str = "settings";

/// How the app is unlocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityType {
    /// No password
    #[default]
    None,
    /// Password checked against an Argon2id hash
    Password,
}

/// Persisted application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsState {
    /// Unlock method
    #[serde(default)]
    pub security_type: SecurityType,
    /// PHC string of the password hash
    #[serde(default, rename = "encryptedPassword", skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Selected network
    #[serde(default)]
    pub network_type: NetworkType,
    /// Onboarding not finished yet
    #[serde(default = "first_time_default")]
    pub is_first_time: bool,
}

fn first_time_default() -> bool {
    true
}

impl Default for SettingsState {
    fn default() -> Self {
        Self {
            security_type: SecurityType::None,
            password_hash: None,
            network_type: NetworkType::Mainnet,
            is_first_time: true,
        }
    }
}

impl SettingsState {
    /// Require a password to unlock
    pub fn set_password(&mut self, password: &str) -> Result<()> {
        let hashed = AppPassphrase::hash(password)?;
        self.password_hash = Some(hashed.hash_string().to_string());
        self.security_type = SecurityType::Password;
        Ok(())
    }

    /// Check a password; always true when no password is configured
    pub fn verify_password(&self, password: &str) -> Result<bool> {
        match (self.security_type, &self.password_hash) {
            (SecurityType::None, _) => Ok(true),
            (SecurityType::Password, Some(hash)) => {
                AppPassphrase::from_hash(hash.clone()).verify(password)
            }
            (SecurityType::Password, None) => Ok(false),
        }
    }
}

/// Loads and saves [`SettingsState`] through the gateway
pub struct SettingsStorage {
    gateway: Arc<SecureStorageGateway>,
}

impl SettingsStorage {
    /// Create settings storage
    pub fn new(gateway: Arc<SecureStorageGateway>) -> Self {
        Self { gateway }
    }

    /// Stored settings, or defaults on first run
    pub fn load(&self) -> Result<SettingsState> {
        Ok(self
            .gateway
            .read_value::<SettingsState>(SETTINGS_KEY)?
            .unwrap_or_default())
    }

    /// Persist settings
    pub fn save(&self, settings: &SettingsState) -> Result<()> {
        self.gateway.write_value(SETTINGS_KEY, settings, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_password_always_verifies() {
        let settings = SettingsState::default();
        assert!(settings.verify_password("anything").unwrap());
    }

    #[test]
    fn test_password_round_trip() {
        let mut settings = SettingsState::default();
        settings.set_password("hunter2hunter2").unwrap();
        assert_eq!(settings.security_type, SecurityType::Password);
        assert!(settings.verify_password("hunter2hunter2").unwrap());
        assert!(!settings.verify_password("wrong password").unwrap());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: SettingsState = serde_json::from_str(r#"{"networkType":"testnet"}"#).unwrap();
        assert_eq!(settings.network_type, NetworkType::Testnet);
        assert!(settings.is_first_time);
        assert_eq!(settings.security_type, SecurityType::None);
    }
}
