use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What `delete_folder` does with a folder that still has children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Refuse the delete with `Error::HasChildren`.
    #[default]
    Reject,
    /// Delete the whole subtree, folder rows and closure rows alike.
    Cascade,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub delete_policy: DeletePolicy,
    /// How long SQLite waits on a locked database before failing a statement.
    pub busy_timeout_ms: u64,
}

impl HierarchyConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            delete_policy: DeletePolicy::Reject,
            busy_timeout_ms: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = HierarchyConfig::from_toml_str("").unwrap();
        assert_eq!(config, HierarchyConfig::default());
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_cascade_policy_from_toml() {
        let config = HierarchyConfig::from_toml_str(
            r#"
            delete_policy = "cascade"
            busy_timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.delete_policy, DeletePolicy::Cascade);
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_unknown_policy_is_config_error() {
        let result = HierarchyConfig::from_toml_str(r#"delete_policy = "orphan""#);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
