//! Encrypted-at-rest key/value storage for the Neon wallet
//!
//! Records live as one JSON file per key under the data directory. Sensitive
//! records pass through a [`SecretSealer`] before they touch the disk.
//!
//! ## Security Features
//!
//! - **Sealing**: ChaCha20-Poly1305 or AES-256-GCM with a versioned frame
//! - **Passphrase KDF**: Argon2id with 64 MiB memory, 3 iterations, 4 lanes
//! - **Legacy upgrade**: plaintext records under sensitive keys are re-sealed on first read

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account_repository;
pub mod error;
pub mod gateway;
pub mod migrations;
pub mod root;
pub mod sealer;
pub mod security;
pub mod settings;

pub use account_repository::AccountRepository;
pub use error::{MigrationError, Result, StorageError};
pub use gateway::{SecureStorageGateway, ADDRESS_BOOK_KEY, SENSITIVE_KEY_FRAGMENTS};
pub use migrations::{MigrationCoordinator, MigrationOutcome, MigrationState};
pub use root::{FixedRoot, PlatformRoot, StorageRootResolver};
pub use sealer::{MasterKeySealer, SecretSealer};
pub use security::{AppPassphrase, EncryptionAlgorithm, MasterKey};
pub use settings::{SecurityType, SettingsState, SettingsStorage};
