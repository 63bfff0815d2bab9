//! Secure storage gateway
//!
//! One JSON file per key under the resolved data directory. Sealed records
//! are stored as a JSON string carrying [`SEALED_PREFIX`] followed by the
//! sealer output; everything else is stored as plain JSON.
//!
//! Keys whose lower-cased name contains one of [`SENSITIVE_KEY_FRAGMENTS`]
//! are always sealed. A structured payload found under such a key is legacy
//! plaintext and is re-sealed the first time it is read.
//!
//! Writes to the same key are not serialized here; callers own that.

use crate::sealer::SecretSealer;
use crate::root::StorageRootResolver;
use crate::{Result, StorageError};
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key-name fragments that mark a record as sensitive
pub const SENSITIVE_KEY_FRAGMENTS: &[&str] = &["address"];

/// Multi-chain address book record
pub const ADDRESS_BOOK_KEY: &str = "multi-chain-address-book";

/// Address book files at or below this size are uninitialized
pub const MIN_SEALED_PAYLOAD_BYTES: u64 = 30;

/// Marker in front of sealed payloads
pub const SEALED_PREFIX: &str = "sealed:";

const RECORD_EXTENSION: &str = "json";

/// Encrypt-at-rest key/value store
pub struct SecureStorageGateway {
    resolver: Arc<dyn StorageRootResolver>,
    sealer: Arc<dyn SecretSealer>,
    root: OnceCell<PathBuf>,
}

impl SecureStorageGateway {
    /// Create a gateway; the root is resolved lazily on first access
    pub fn new(resolver: Arc<dyn StorageRootResolver>, sealer: Arc<dyn SecretSealer>) -> Self {
        Self {
            resolver,
            sealer,
            root: OnceCell::new(),
        }
    }

    /// Whether a key is sealed regardless of the caller's flag
    pub fn is_sensitive_key(key: &str) -> bool {
        let key = key.to_lowercase();
        SENSITIVE_KEY_FRAGMENTS
            .iter()
            .any(|fragment| key.contains(fragment))
    }

    /// Data directory, resolved and created once per gateway
    pub fn root(&self) -> Result<&Path> {
        self.root
            .get_or_try_init(|| {
                let root = self.resolver.resolve()?;
                if !root.is_absolute() {
                    return Err(StorageError::PathUnavailable(format!(
                        "Storage root is not absolute: {}",
                        root.display()
                    )));
                }
                std::fs::create_dir_all(&root).map_err(|e| {
                    StorageError::PathUnavailable(format!("{}: {}", root.display(), e))
                })?;
                tracing::debug!(root = %root.display(), "Resolved storage root");
                Ok(root)
            })
            .map(PathBuf::as_path)
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root()?.join(format!("{}.{}", key, RECORD_EXTENSION)))
    }

    /// Store a JSON value. Sensitive values, and any value under a
    /// sensitive key, are sealed first.
    pub fn write(&self, key: &str, value: &Value, sensitive: bool) -> Result<()> {
        let path = self.record_path(key)?;
        let sealed = sensitive || Self::is_sensitive_key(key);
        let payload = if sealed {
            let plaintext = serde_json::to_vec(value)?;
            Value::String(format!("{}{}", SEALED_PREFIX, self.sealer.encrypt(&plaintext)?))
        } else {
            value.clone()
        };

        let tmp = path.with_extension("json.tmp");
        let written = std::fs::write(&tmp, serde_json::to_vec(&payload)?)
            .and_then(|()| std::fs::rename(&tmp, &path));
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&tmp) {
                tracing::debug!(key, error = %cleanup, "Temporary record not removed");
            }
            return Err(e.into());
        }
        tracing::debug!(key, sealed, "Wrote storage record");
        Ok(())
    }

    /// Serialize and store a value
    pub fn write_value<T: Serialize>(&self, key: &str, value: &T, sensitive: bool) -> Result<()> {
        self.write(key, &serde_json::to_value(value)?, sensitive)
    }

    /// Read a record; `None` when the key was never written
    pub fn read(&self, key: &str) -> Result<Option<Value>> {
        let path = self.record_path(key)?;
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let undersized = key == ADDRESS_BOOK_KEY && raw.len() as u64 <= MIN_SEALED_PAYLOAD_BYTES;

        let payload: Value = match serde_json::from_slice(&raw) {
            Ok(payload) => payload,
            Err(_) if undersized => return Ok(Some(empty_address_book(key, raw.len()))),
            Err(e) => return Err(corrupt(key, e)),
        };
        let sensitive = Self::is_sensitive_key(key);

        match payload {
            Value::String(_) if undersized => Ok(Some(empty_address_book(key, raw.len()))),
            Value::String(text) => {
                if let Some(sealed) = text.strip_prefix(SEALED_PREFIX) {
                    self.open(key, sealed).map(Some)
                } else if sensitive {
                    self.open(key, &text).map(Some)
                } else {
                    Ok(Some(Value::String(text)))
                }
            }
            plain if sensitive => {
                self.write(key, &plain, true)?;
                tracing::info!(key, "Sealed legacy plaintext record");
                Ok(Some(plain))
            }
            plain => Ok(Some(plain)),
        }
    }

    /// Read and deserialize a record
    pub fn read_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| corrupt(key, e)),
            None => Ok(None),
        }
    }

    /// Delete a record; returns whether it existed
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.record_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(key, "Removed storage record");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn open(&self, key: &str, sealed: &str) -> Result<Value> {
        let plaintext = self.sealer.decrypt(sealed)?;
        serde_json::from_slice(&plaintext).map_err(|e| corrupt(key, e))
    }
}

fn empty_address_book(key: &str, size: usize) -> Value {
    tracing::warn!(
        key,
        size,
        "Address book payload too small to be sealed, treating as empty"
    );
    Value::Object(Default::default())
}

fn corrupt(key: &str, e: serde_json::Error) -> StorageError {
    StorageError::CorruptPayload {
        key: key.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_key_classification() {
        assert!(SecureStorageGateway::is_sensitive_key("address"));
        assert!(SecureStorageGateway::is_sensitive_key("Multi-Chain-ADDRESS-Book"));
        assert!(SecureStorageGateway::is_sensitive_key("lastAddressUsed"));
        assert!(!SecureStorageGateway::is_sensitive_key("settings"));
        assert!(!SecureStorageGateway::is_sensitive_key("accounts"));
    }
}
