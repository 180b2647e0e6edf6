//! Error types for the AWS backend.

use thiserror::Error;

/// Result type alias for cloud provider operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors surfaced by the registry and the autoscaling service.
///
/// Backend failures pass through the registry untouched, so this type is
/// `Clone + PartialEq` to let callers compare them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    /// The describe call failed (transport, auth, throttling).
    #[error("describe auto scaling groups failed: {0}")]
    Describe(String),

    /// A node group outlived the provider that registered it.
    #[error("cloud provider dropped while node group {0} was still in use")]
    ProviderDropped(String),
}

/// A node that claims membership of a node group the backend does not
/// list it under.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node {node_name}, {provider_id} belongs in a different asg than {node_group}")]
pub struct NodeNotInAutoScalingGroup {
    pub node_name: String,
    pub provider_id: String,
    pub node_group: String,
}
