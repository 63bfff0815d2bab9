//! Service configuration
//!
//! Read from an optional JSON file, then overridden by `NEON_DATA_DIR`,
//! `NEON_LOG` and `NEON_LOG_JSON`.

use crate::{Result, ServiceError};
use neon_session::RouterConfig;
use neon_storage::{FixedRoot, PlatformRoot, StorageRootResolver};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Data directory override
pub const ENV_DATA_DIR: &str = "NEON_DATA_DIR";
/// Log filter override
pub const ENV_LOG: &str = "NEON_LOG";
/// JSON log switch
pub const ENV_LOG_JSON: &str = "NEON_LOG_JSON";

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Application name; selects the platform data directory
    pub app_name: String,
    /// Explicit data directory; platform default when unset
    pub data_dir: Option<PathBuf>,
    /// Delay before routing request changes
    pub settle_delay_ms: u64,
    /// Displayed requests older than this are reported as timed out
    pub request_ttl_secs: u64,
    /// `tracing` filter directive
    pub log_filter: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_name: "neon-wallet".to_string(),
            data_dir: None,
            settle_delay_ms: 1000,
            request_ttl_secs: 300,
            log_filter: "info".to_string(),
            log_json: false,
        }
    }
}

impl ServiceConfig {
    /// Load from a JSON file; defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(filter) = lookup(ENV_LOG).filter(|v| !v.is_empty()) {
            self.log_filter = filter;
        }
        if let Some(json) = lookup(ENV_LOG_JSON) {
            self.log_json = match json.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(ServiceError::Config(format!(
                        "{} must be a boolean, got {}",
                        ENV_LOG_JSON, other
                    )))
                }
            };
        }
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(ServiceError::Config("appName must not be empty".to_string()));
        }
        if let Some(dir) = &self.data_dir {
            if !dir.is_absolute() {
                return Err(ServiceError::Config(format!(
                    "dataDir must be absolute: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Storage root for this configuration
    pub fn root_resolver(&self) -> Arc<dyn StorageRootResolver> {
        match &self.data_dir {
            Some(dir) => Arc::new(FixedRoot(dir.clone())),
            None => Arc::new(PlatformRoot::new(self.app_name.clone())),
        }
    }

    /// Router timing
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            request_ttl: Duration::from_secs(self.request_ttl_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.router_config().settle_delay, Duration::from_millis(1000));
        assert_eq!(config.router_config().request_ttl, Duration::from_secs(300));
        assert_eq!(config.log_filter, "info");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"settleDelayMs": 250, "logJson": true}"#).unwrap();

        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.settle_delay_ms, 250);
        assert!(config.log_json);
        assert_eq!(config.app_name, "neon-wallet");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().to_string();
        let mut config = ServiceConfig::default();
        config
            .apply_overrides(env(&[
                (ENV_DATA_DIR, data_dir.as_str()),
                (ENV_LOG, "neon_sync=debug"),
                (ENV_LOG_JSON, "true"),
            ]))
            .unwrap();

        assert_eq!(config.data_dir.as_deref(), Some(dir.path()));
        assert_eq!(config.log_filter, "neon_sync=debug");
        assert!(config.log_json);
    }

    #[test]
    fn test_rejects_bad_overrides() {
        let mut config = ServiceConfig::default();
        assert!(matches!(
            config.apply_overrides(env(&[(ENV_LOG_JSON, "maybe")])),
            Err(ServiceError::Config(_))
        ));

        let mut config = ServiceConfig::default();
        assert!(config
            .apply_overrides(env(&[(ENV_DATA_DIR, "relative/dir")]))
            .is_err());
    }
}
