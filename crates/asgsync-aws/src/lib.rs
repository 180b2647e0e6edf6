//! asgsync-aws — node-group registry backed by AWS auto scaling groups.
//!
//! The [`CloudProvider`] caches one [`NodeGroup`] per registered scaling
//! group and keeps each group's desired capacity in sync with the backend
//! through a single batched describe call per sync.
//!
//! # Architecture
//!
//! ```text
//! CloudProvider (Clone, shared handle)
//!   └── Arc<ProviderInner>
//!       ├── Arc<dyn AutoscalingService>   (remote describe-by-name)
//!       └── RwLock<HashMap<id, Arc<NodeGroup>>>
//!               └── NodeGroup ── Weak<ProviderInner> (owner handle)
//! ```
//!
//! # Sync protocol
//!
//! `register_node_groups` and `refresh` both issue the remote call with
//! no lock held, then apply the whole result under one write lock. A
//! failed call returns before the lock is taken, so readers only ever see
//! the map before or after a complete sync. Node groups are immutable
//! snapshots; a sync swaps in a new `Arc<NodeGroup>` rather than mutating
//! the one a reader may hold.

pub mod error;
pub mod mock;
pub mod node_group;
pub mod provider;
pub mod service;

pub use error::{CloudError, CloudResult, NodeNotInAutoScalingGroup};
pub use mock::MockAutoscalingService;
pub use node_group::NodeGroup;
pub use provider::{CloudProvider, PROVIDER_NAME};
pub use service::{AutoScalingGroup, AutoscalingService, DescribeFuture, Instance};
