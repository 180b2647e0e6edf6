//! Node-group configuration file parser.
//!
//! ```toml
//! refresh_interval = "60s"
//!
//! [provider]
//! name = "aws"
//!
//! [[node_groups]]
//! name = "default"
//! cloud_provider_group_name = "asg-default"
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration::parse_duration_or;

/// Provider name accepted by [`SyncConfig::validate`].
pub const AWS_PROVIDER: &str = "aws";

/// Interval used when `refresh_interval` is absent or unparsable.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub node_groups: Vec<NodeGroupConfig>,
    pub refresh_interval: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeGroupConfig {
    /// Cluster-side name of the group.
    pub name: String,
    /// Name of the backing cloud scaling group.
    pub cloud_provider_group_name: String,
}

impl SyncConfig {
    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Read, parse and validate in one go.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.provider.name != AWS_PROVIDER {
            return Err(ConfigError::Invalid(format!(
                "unsupported provider {:?}",
                self.provider.name
            )));
        }
        if self.refresh_interval().is_zero() {
            return Err(ConfigError::Invalid(
                "refresh_interval must be greater than zero".into(),
            ));
        }

        let mut names = HashSet::new();
        let mut groups = HashSet::new();
        for ng in &self.node_groups {
            if ng.name.trim().is_empty() {
                return Err(ConfigError::Invalid("node group name is empty".into()));
            }
            if ng.cloud_provider_group_name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "node group {} has an empty cloud_provider_group_name",
                    ng.name
                )));
            }
            if !names.insert(ng.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate node group name {}",
                    ng.name
                )));
            }
            if !groups.insert(ng.cloud_provider_group_name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "cloud group {} is referenced twice",
                    ng.cloud_provider_group_name
                )));
            }
        }
        Ok(())
    }

    /// Cloud group names, in declaration order.
    pub fn group_ids(&self) -> Vec<String> {
        self.node_groups
            .iter()
            .map(|ng| ng.cloud_provider_group_name.clone())
            .collect()
    }

    pub fn refresh_interval(&self) -> Duration {
        match &self.refresh_interval {
            Some(s) => parse_duration_or(s, DEFAULT_REFRESH_INTERVAL),
            None => DEFAULT_REFRESH_INTERVAL,
        }
    }
}
