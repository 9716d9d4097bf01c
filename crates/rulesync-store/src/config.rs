//! Store configuration

use crate::errors::{fixture_validation, io_error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const IN_MEMORY: &str = ":memory:";

/// Where and how to open a SQLite database
///
/// ```
/// use rulesync_store::StoreConfig;
///
/// let config = StoreConfig::from_yaml_str("path: /var/lib/rulesync/state.db\n").unwrap();
/// assert_eq!(config.busy_timeout_ms, 5000);
/// assert!(!config.is_in_memory());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Database file, or `:memory:`
    pub path: PathBuf,
    /// How long a writer waits on a locked database
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(IN_MEMORY),
            busy_timeout_ms: 5000,
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    /// # Errors
    ///
    /// `InvalidFixture` if the YAML is malformed or has unknown keys.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| fixture_validation(&format!("store config parse error: {}", e)))
    }

    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`StoreConfig::from_yaml_str`].
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| io_error("read_store_config", e))?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_in_memory() {
        assert!(StoreConfig::default().is_in_memory());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = StoreConfig::from_yaml_str("busy_timeout_ms: 250\n").unwrap();
        assert!(config.is_in_memory());
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(StoreConfig::from_yaml_str("pth: x.db\n").is_err());
    }
}
