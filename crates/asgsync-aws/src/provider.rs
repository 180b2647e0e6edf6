//! CloudProvider — the node-group registry.
//!
//! Owns the map from group id to [`NodeGroup`] and keeps it in sync with
//! the autoscaling service. Remote calls are made with no lock held; each
//! successful call is applied under a single write lock.
//!
//! Each sync draws a generation number before its remote call. When two
//! syncs overlap, an entry is only overwritten by a sync with a newer
//! generation, so a slow response never rolls back a faster, later one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use asgsync_core::SyncConfig;

use crate::error::CloudResult;
use crate::node_group::NodeGroup;
use crate::service::AutoscalingService;

/// Name of this backend.
pub const PROVIDER_NAME: &str = asgsync_core::config::AWS_PROVIDER;

pub(crate) struct ProviderInner {
    pub(crate) service: Arc<dyn AutoscalingService>,
    node_groups: RwLock<HashMap<String, Arc<NodeGroup>>>,
    generation: AtomicU64,
}

impl ProviderInner {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Registry of node groups backed by auto scaling groups.
///
/// Cheap to clone; clones share the same registry. Node groups hold only
/// a weak handle back to it.
#[derive(Clone)]
pub struct CloudProvider {
    inner: Arc<ProviderInner>,
}

impl CloudProvider {
    pub fn new(service: Arc<dyn AutoscalingService>) -> Self {
        Self::with_capacity(service, 0)
    }

    /// Create an empty registry with room for `capacity` groups.
    pub fn with_capacity(service: Arc<dyn AutoscalingService>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                service,
                node_groups: RwLock::new(HashMap::with_capacity(capacity)),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Snapshot of every registered node group, in no particular order.
    pub fn node_groups(&self) -> Vec<Arc<NodeGroup>> {
        let node_groups = self.inner.node_groups.read().expect("node groups lock");
        node_groups.values().cloned().collect()
    }

    pub fn get_node_group(&self, id: &str) -> Option<Arc<NodeGroup>> {
        let node_groups = self.inner.node_groups.read().expect("node groups lock");
        node_groups.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.node_groups.read().expect("node groups lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discover and register the named groups with one describe call.
    ///
    /// Every group the backend returns is inserted, replacing any entry
    /// with the same id. Ids the backend does not return are skipped
    /// silently. An empty `ids` is passed to the backend as is. On error
    /// the registry is left untouched. Entries written by a newer sync
    /// that finished first are kept.
    pub async fn register_node_groups<S>(&self, ids: &[S]) -> CloudResult<()>
    where
        S: AsRef<str> + Sync,
    {
        let names: Vec<String> = ids.iter().map(|id| id.as_ref().to_string()).collect();
        let generation = self.inner.next_generation();
        let groups = self
            .inner
            .service
            .describe_auto_scaling_groups(&names)
            .await?;

        let owner = Arc::downgrade(&self.inner);
        let fresh: Vec<Arc<NodeGroup>> = groups
            .iter()
            .map(|g| Arc::new(NodeGroup::from_group(g, generation, owner.clone())))
            .collect();

        let mut superseded = 0usize;
        {
            let mut node_groups = self.inner.node_groups.write().expect("node groups lock");
            for ng in fresh {
                match node_groups.get(ng.id()) {
                    Some(current) if current.generation() > generation => superseded += 1,
                    _ => {
                        node_groups.insert(ng.id().to_string(), ng);
                    }
                }
            }
        }

        for name in &names {
            if !groups.iter().any(|g| &g.name == name) {
                debug!(node_group = %name, "auto scaling group not found, skipping");
            }
        }
        info!(
            requested = names.len(),
            registered = groups.len(),
            superseded,
            "node groups registered"
        );
        Ok(())
    }

    /// Register the cloud groups named in `config`.
    pub async fn register_from_config(&self, config: &SyncConfig) -> CloudResult<()> {
        let ids = config.group_ids();
        self.register_node_groups(ids.as_slice()).await
    }

    /// Re-sync every registered group with one describe call.
    ///
    /// Groups missing from the response keep their last known values. On
    /// error nothing is updated. An empty registry makes no remote call,
    /// since an empty name list describes every group in the account.
    pub async fn refresh(&self) -> CloudResult<()> {
        let (ids, generation): (Vec<String>, u64) = {
            let node_groups = self.inner.node_groups.read().expect("node groups lock");
            (
                node_groups.keys().cloned().collect(),
                self.inner.next_generation(),
            )
        };
        if ids.is_empty() {
            debug!("no node groups registered, skipping refresh");
            return Ok(());
        }

        let groups = self
            .inner
            .service
            .describe_auto_scaling_groups(&ids)
            .await?;

        let mut updated = 0usize;
        let mut superseded = 0usize;
        {
            let mut node_groups = self.inner.node_groups.write().expect("node groups lock");
            for group in &groups {
                let Some(current) = node_groups.get_mut(&group.name) else {
                    continue;
                };
                if current.generation() > generation {
                    superseded += 1;
                    continue;
                }
                let mut next = NodeGroup::clone(current);
                next.sync_from(group, generation);
                *current = Arc::new(next);
                updated += 1;
            }
        }

        debug!(
            updated,
            superseded,
            stale = ids.len().saturating_sub(updated + superseded),
            "node groups refreshed"
        );
        Ok(())
    }

    /// Refresh every `interval` until `shutdown` fires. Errors are logged
    /// and the loop carries on.
    pub async fn run_refresh_loop(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = interval.as_secs(),
            node_groups = self.len(),
            "refresh loop started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = self.refresh().await {
                        error!(error = %e, "node group refresh failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("refresh loop shutting down");
                    break;
                }
            }
        }
    }
}
