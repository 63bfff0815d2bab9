//! Secret sealing primitives used by the storage gateway

use crate::security::{derive_key_bytes, generate_salt, EncryptionAlgorithm, MasterKey};
use crate::{Result, StorageError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// File holding the hex-encoded KDF salt, next to the records
pub const SALT_FILE: &str = ".sealer-salt";

/// Opaque encrypt/decrypt facility.
///
/// Implementations must round-trip: `decrypt(encrypt(b)) == b`.
pub trait SecretSealer: Send + Sync {
    /// Seal UTF-8 JSON bytes into an opaque string
    fn encrypt(&self, plaintext: &[u8]) -> Result<String>;

    /// Open a string produced by [`SecretSealer::encrypt`]
    fn decrypt(&self, sealed: &str) -> Result<Vec<u8>>;
}

/// Sealer backed by a [`MasterKey`]; output is the base64 frame
pub struct MasterKeySealer {
    key: MasterKey,
}

impl MasterKeySealer {
    /// Wrap an existing key
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }

    /// Derive the key from a passphrase and the salt stored under `root`,
    /// creating the salt on first use.
    pub fn open_with_passphrase(root: &Path, passphrase: &str) -> Result<Self> {
        let salt_path = root.join(SALT_FILE);
        let salt = if salt_path.exists() {
            let encoded = std::fs::read_to_string(&salt_path)?;
            hex::decode(encoded.trim()).map_err(|e| StorageError::CorruptPayload {
                key: SALT_FILE.to_string(),
                reason: e.to_string(),
            })?
        } else {
            std::fs::create_dir_all(root)?;
            let salt = generate_salt();
            std::fs::write(&salt_path, hex::encode(salt))?;
            tracing::info!(path = %salt_path.display(), "Created sealer salt");
            salt.to_vec()
        };
        let key_bytes = derive_key_bytes(passphrase, &salt)?;
        let key = MasterKey::from_bytes(&key_bytes[..], EncryptionAlgorithm::ChaCha20Poly1305)?;
        Ok(Self::new(key))
    }
}

impl SecretSealer for MasterKeySealer {
    fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        Ok(STANDARD.encode(self.key.encrypt(plaintext)?))
    }

    fn decrypt(&self, sealed: &str) -> Result<Vec<u8>> {
        let frame = STANDARD
            .decode(sealed)
            .map_err(|e| StorageError::CryptoFailure(format!("Invalid base64: {}", e)))?;
        self.key.decrypt(&frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sealer_round_trip() {
        let sealer = MasterKeySealer::new(MasterKey::generate(EncryptionAlgorithm::AesGcm));
        let sealed = sealer.encrypt(br#"{"a":1}"#).unwrap();
        assert_ne!(sealed.as_bytes(), br#"{"a":1}"#);
        assert_eq!(sealer.decrypt(&sealed).unwrap(), br#"{"a":1}"#);
    }

    #[test]
    fn test_garbage_is_crypto_failure() {
        let sealer = MasterKeySealer::new(MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305));
        assert!(matches!(
            sealer.decrypt("not base64!"),
            Err(StorageError::CryptoFailure(_))
        ));
    }

    #[test]
    fn test_passphrase_sealer_reuses_salt() {
        let dir = tempfile::tempdir().unwrap();
        let first = MasterKeySealer::open_with_passphrase(dir.path(), "correct horse").unwrap();
        let sealed = first.encrypt(b"\"v\"").unwrap();

        let second = MasterKeySealer::open_with_passphrase(dir.path(), "correct horse").unwrap();
        assert_eq!(second.decrypt(&sealed).unwrap(), b"\"v\"");

        let wrong = MasterKeySealer::open_with_passphrase(dir.path(), "battery staple").unwrap();
        assert!(wrong.decrypt(&sealed).is_err());
    }
}
