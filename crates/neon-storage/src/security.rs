//! Encryption primitives
//!
//! AES-256-GCM and ChaCha20-Poly1305 sealing with a versioned frame,
//! Argon2id for passphrase hashing and key derivation, and key zeroization.

use crate::{Result, StorageError};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm,
};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use chacha20poly1305::ChaCha20Poly1305;
use rand::RngCore;
use zeroize::Zeroizing;

const FRAME_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = 2 + NONCE_LEN;

/// Encryption algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionAlgorithm {
    /// AES-256-GCM
    AesGcm,
    /// ChaCha20-Poly1305
    ChaCha20Poly1305,
}

impl EncryptionAlgorithm {
    fn tag(self) -> u8 {
        match self {
            EncryptionAlgorithm::AesGcm => 0,
            EncryptionAlgorithm::ChaCha20Poly1305 => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(EncryptionAlgorithm::AesGcm),
            1 => Ok(EncryptionAlgorithm::ChaCha20Poly1305),
            other => Err(StorageError::CryptoFailure(format!(
                "Unknown algorithm tag: {}",
                other
            ))),
        }
    }
}

/// 256-bit key used to seal stored records
#[derive(Clone)]
pub struct MasterKey {
    key: Zeroizing<[u8; 32]>,
    algorithm: EncryptionAlgorithm,
}

impl MasterKey {
    /// Generate new random master key
    pub fn generate(algorithm: EncryptionAlgorithm) -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self {
            key: Zeroizing::new(key),
            algorithm,
        }
    }

    /// Create from bytes
    pub fn from_bytes(bytes: &[u8], algorithm: EncryptionAlgorithm) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(StorageError::CryptoFailure("Invalid key length".to_string()));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(bytes);
        Ok(Self {
            key: Zeroizing::new(key),
            algorithm,
        })
    }

    /// Algorithm used for new frames
    pub fn algorithm(&self) -> EncryptionAlgorithm {
        self.algorithm
    }

    /// Seal plaintext into `[version][algorithm][nonce(12)][ciphertext]`
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = match self.algorithm {
            EncryptionAlgorithm::AesGcm => Aes256Gcm::new(self.key.as_ref().into())
                .encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext),
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                ChaCha20Poly1305::new(self.key.as_ref().into())
                    .encrypt(chacha20poly1305::Nonce::from_slice(&nonce), plaintext)
            }
        }
        .map_err(|e| StorageError::CryptoFailure(e.to_string()))?;

        let mut frame = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        frame.push(FRAME_VERSION);
        frame.push(self.algorithm.tag());
        frame.extend_from_slice(&nonce);
        frame.extend_from_slice(&ciphertext);
        Ok(frame)
    }

    /// Open a frame produced by [`MasterKey::encrypt`].
    ///
    /// The algorithm is read from the frame, so records sealed before an
    /// algorithm switch stay readable.
    pub fn decrypt(&self, frame: &[u8]) -> Result<Vec<u8>> {
        if frame.len() < HEADER_LEN {
            return Err(StorageError::CryptoFailure(
                "Invalid ciphertext length".to_string(),
            ));
        }
        if frame[0] != FRAME_VERSION {
            return Err(StorageError::CryptoFailure(format!(
                "Unsupported encryption version: {}",
                frame[0]
            )));
        }
        let algorithm = EncryptionAlgorithm::from_tag(frame[1])?;
        let nonce = &frame[2..HEADER_LEN];
        let ciphertext = &frame[HEADER_LEN..];

        match algorithm {
            EncryptionAlgorithm::AesGcm => Aes256Gcm::new(self.key.as_ref().into())
                .decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext),
            EncryptionAlgorithm::ChaCha20Poly1305 => {
                ChaCha20Poly1305::new(self.key.as_ref().into())
                    .decrypt(chacha20poly1305::Nonce::from_slice(nonce), ciphertext)
            }
        }
        .map_err(|e| StorageError::CryptoFailure(e.to_string()))
    }
}

/// App password hashed with Argon2id
pub struct AppPassphrase {
    hash: String,
}

impl AppPassphrase {
    /// Memory: 64 MiB (65536 KiB), Iterations: 3, Parallelism: 4
    const ARGON2_PARAMS: (u32, u32, u32) = (65536, 3, 4);

    /// Minimum password length
    pub const MIN_PASSPHRASE_LENGTH: usize = 8;

    /// Validate password meets minimum requirements
    pub fn validate(passphrase: &str) -> Result<()> {
        if passphrase.chars().count() < Self::MIN_PASSPHRASE_LENGTH {
            return Err(StorageError::Security(format!(
                "Password must be at least {} characters",
                Self::MIN_PASSPHRASE_LENGTH
            )));
        }
        Ok(())
    }

    /// Hash password with Argon2id (validates length first)
    pub fn hash(passphrase: &str) -> Result<Self> {
        Self::validate(passphrase)?;
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2id()?
            .hash_password(passphrase.as_bytes(), &salt)
            .map_err(|e| StorageError::CryptoFailure(e.to_string()))?
            .to_string();
        Ok(Self { hash })
    }

    /// Verify password
    pub fn verify(&self, passphrase: &str) -> Result<bool> {
        let parsed = PasswordHash::new(&self.hash)
            .map_err(|e| StorageError::CryptoFailure(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(passphrase.as_bytes(), &parsed)
            .is_ok())
    }

    /// PHC hash string for storage
    pub fn hash_string(&self) -> &str {
        &self.hash
    }

    /// Load from stored hash
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }
}

fn argon2id() -> Result<Argon2<'static>> {
    let (m_cost, t_cost, p_cost) = AppPassphrase::ARGON2_PARAMS;
    let params = ParamsBuilder::new()
        .m_cost(m_cost)
        .t_cost(t_cost)
        .p_cost(p_cost)
        .output_len(32)
        .build()
        .map_err(|e| StorageError::CryptoFailure(e.to_string()))?;
    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Derive raw key bytes from a passphrase using Argon2id.
pub fn derive_key_bytes(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    if salt.len() < 16 {
        return Err(StorageError::CryptoFailure("Salt too short".to_string()));
    }
    let mut key = Zeroizing::new([0u8; 32]);
    argon2id()?
        .hash_password_into(passphrase.as_bytes(), salt, &mut *key)
        .map_err(|e| StorageError::CryptoFailure(e.to_string()))?;
    Ok(key)
}

/// Random 32-byte salt
pub fn generate_salt() -> [u8; 32] {
    let mut salt = [0u8; 32];
    OsRng.fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let key = MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305);
        let frame = key.encrypt(b"{}").unwrap();
        assert_eq!(frame[0], 1);
        assert_eq!(frame[1], 1);
        assert_eq!(key.decrypt(&frame).unwrap(), b"{}");
    }

    #[test]
    fn test_tampered_frame_fails() {
        let key = MasterKey::generate(EncryptionAlgorithm::AesGcm);
        let mut frame = key.encrypt(b"secret").unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0xff;
        assert!(matches!(key.decrypt(&frame), Err(StorageError::CryptoFailure(_))));
        assert!(key.decrypt(&[1, 0, 0]).is_err());
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305);
        let b = MasterKey::generate(EncryptionAlgorithm::ChaCha20Poly1305);
        let frame = a.encrypt(b"secret").unwrap();
        assert!(b.decrypt(&frame).is_err());
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(AppPassphrase::validate("short").is_err());
        assert!(AppPassphrase::validate("long enough").is_ok());
    }

    #[test]
    fn test_short_salt_rejected() {
        assert!(derive_key_bytes("passphrase", &[0u8; 8]).is_err());
    }
}
