//! asgsync-core — shared types for the node-group registry.
//!
//! - [`provider_id`]: canonical `aws:///<zone>/<instance-id>` identifiers
//!   used to correlate cluster nodes with cloud instances.
//! - [`config`]: the TOML file naming the managed node groups.
//! - [`duration`]: interval strings such as `"30s"` or `"5m"`.

pub mod config;
pub mod duration;
pub mod provider_id;

pub use config::{ConfigError, ConfigResult, NodeGroupConfig, SyncConfig};
pub use provider_id::ProviderId;
