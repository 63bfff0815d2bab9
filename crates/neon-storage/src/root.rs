//! Data directory resolution

use crate::{Result, StorageError};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Resolves the absolute directory records are stored in
pub trait StorageRootResolver: Send + Sync {
    /// Absolute data directory
    fn resolve(&self) -> Result<PathBuf>;
}

/// Explicit directory, used for tests and `NEON_DATA_DIR`
#[derive(Debug, Clone)]
pub struct FixedRoot(pub PathBuf);

impl StorageRootResolver for FixedRoot {
    fn resolve(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}

/// Platform data directory for an application name
#[derive(Debug, Clone)]
pub struct PlatformRoot {
    app_name: String,
}

impl PlatformRoot {
    /// Resolver for `app_name`
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl StorageRootResolver for PlatformRoot {
    fn resolve(&self) -> Result<PathBuf> {
        ProjectDirs::from("io", "Neon", &self.app_name)
            .map(|dirs| dirs.data_dir().join("storage"))
            .ok_or_else(|| {
                StorageError::PathUnavailable(format!(
                    "No home directory for application {}",
                    self.app_name
                ))
            })
    }
}
