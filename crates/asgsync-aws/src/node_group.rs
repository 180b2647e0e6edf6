//! NodeGroup — the cached view of one auto scaling group.

use std::fmt;
use std::sync::Weak;

use crate::error::{CloudError, CloudResult, NodeNotInAutoScalingGroup};
use crate::provider::ProviderInner;
use crate::service::AutoScalingGroup;

/// One registered auto scaling group.
///
/// Every field except `id` is copied from the most recent successful
/// register or refresh that included this group. Values can be stale
/// between refreshes. There is no public way to change them.
#[derive(Clone)]
pub struct NodeGroup {
    id: String,
    target_size: i64,
    min_size: i64,
    max_size: i64,
    /// Provider IDs of the group's instances.
    nodes: Vec<String>,
    /// Sync that produced this snapshot; later syncs have larger values.
    generation: u64,
    owner: Weak<ProviderInner>,
}

impl NodeGroup {
    pub(crate) fn from_group(
        group: &AutoScalingGroup,
        generation: u64,
        owner: Weak<ProviderInner>,
    ) -> Self {
        let mut node_group = Self {
            id: group.name.clone(),
            target_size: 0,
            min_size: 0,
            max_size: 0,
            nodes: Vec::new(),
            generation,
            owner,
        };
        node_group.sync_from(group, generation);
        node_group
    }

    /// Overwrite the cached sizes and membership. Only the registry calls
    /// this, on a snapshot that is not yet visible to readers.
    pub(crate) fn sync_from(&mut self, group: &AutoScalingGroup, generation: u64) {
        debug_assert_eq!(self.id, group.name);
        self.generation = generation;
        self.set_target_size(group.desired_capacity);
        self.min_size = group.min_size;
        self.max_size = group.max_size;
        self.nodes = group.instances.iter().map(|i| i.provider_id()).collect();
    }

    pub(crate) fn set_target_size(&mut self, size: i64) {
        self.target_size = size;
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Desired capacity as of the last sync.
    pub fn target_size(&self) -> i64 {
        self.target_size
    }

    pub fn min_size(&self) -> i64 {
        self.min_size
    }

    pub fn max_size(&self) -> i64 {
        self.max_size
    }

    /// Provider IDs of the instances in the group as of the last sync.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn belongs(&self, provider_id: &str) -> bool {
        self.nodes.iter().any(|n| n == provider_id)
    }

    /// Check that a cluster node claiming membership of this group is
    /// actually one of its instances.
    pub fn check_membership(
        &self,
        node_name: &str,
        provider_id: &str,
    ) -> Result<(), NodeNotInAutoScalingGroup> {
        if self.belongs(provider_id) {
            return Ok(());
        }
        Err(NodeNotInAutoScalingGroup {
            node_name: node_name.to_string(),
            provider_id: provider_id.to_string(),
            node_group: self.id.clone(),
        })
    }

    /// Describe just this group through the owning provider.
    ///
    /// Read-only: the registry is not updated with the result.
    pub async fn describe(&self) -> CloudResult<Option<AutoScalingGroup>> {
        let owner = self
            .owner
            .upgrade()
            .ok_or_else(|| CloudError::ProviderDropped(self.id.clone()))?;
        let groups = owner
            .service
            .describe_auto_scaling_groups(std::slice::from_ref(&self.id))
            .await?;
        Ok(groups.into_iter().find(|g| g.name == self.id))
    }
}

impl fmt::Debug for NodeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeGroup")
            .field("id", &self.id)
            .field("target_size", &self.target_size)
            .field("min_size", &self.min_size)
            .field("max_size", &self.max_size)
            .field("nodes", &self.nodes.len())
            .field("generation", &self.generation)
            .finish()
    }
}
