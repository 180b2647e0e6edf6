//! End-to-end registry behavior against in-memory autoscaling services.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use asgsync_aws::{
    AutoScalingGroup, AutoscalingService, CloudError, CloudProvider, DescribeFuture,
    MockAutoscalingService, NodeGroup,
};
use asgsync_core::SyncConfig;

fn sizes(provider: &CloudProvider) -> BTreeMap<String, i64> {
    provider
        .node_groups()
        .iter()
        .map(|ng| (ng.id().to_string(), ng.target_size()))
        .collect()
}

#[tokio::test]
async fn register_some_missing() {
    let service = Arc::new(MockAutoscalingService::new(vec![AutoScalingGroup::new("1", 1)]));
    let provider = CloudProvider::with_capacity(service, 2);

    provider.register_node_groups(&["1", "2"]).await.unwrap();

    let ng = provider.get_node_group("1").unwrap();
    assert_eq!(ng.id(), "1");
    assert!(provider.get_node_group("2").is_none());
    assert_eq!(provider.len(), 1);
}

#[tokio::test]
async fn register_none_exist() {
    let service = Arc::new(MockAutoscalingService::new(vec![]));
    let provider = CloudProvider::new(service);

    provider.register_node_groups(&["1"]).await.unwrap();
    assert!(provider.is_empty());
}

#[tokio::test]
async fn register_error_leaves_registry_empty() {
    let err = CloudError::Describe("no groups".into());
    let service = Arc::new(MockAutoscalingService::failing(err.clone()));
    let provider = CloudProvider::new(service);

    assert_eq!(provider.register_node_groups(&["1"]).await.unwrap_err(), err);
    assert!(provider.node_groups().is_empty());
}

#[tokio::test]
async fn register_error_leaves_existing_entries_untouched() {
    let service = Arc::new(MockAutoscalingService::new(vec![
        AutoScalingGroup::new("1", 1),
        AutoScalingGroup::new("2", 2),
    ]));
    let provider = CloudProvider::new(service.clone());
    provider.register_node_groups(&["1"]).await.unwrap();
    let before = sizes(&provider);

    service.set_desired_capacity("1", 10);
    service.set_error(Some(CloudError::Describe("auth".into())));
    assert!(provider.register_node_groups(&["1", "2"]).await.is_err());

    assert_eq!(sizes(&provider), before);
}

// Registering zero ids is not special-cased: the empty list goes to the
// backend and whatever it does decides the outcome.
#[tokio::test]
async fn register_empty_ids_passes_through_to_backend() {
    let failing = Arc::new(MockAutoscalingService::failing(CloudError::Describe(
        "no groups".into(),
    )));
    let provider = CloudProvider::new(failing.clone());
    let no_ids: [&str; 0] = [];
    assert_eq!(
        provider.register_node_groups(&no_ids).await.unwrap_err(),
        CloudError::Describe("no groups".into())
    );
    assert_eq!(failing.calls(), vec![Vec::<String>::new()]);

    // The mock, like the real API, describes every group for an empty list.
    let service = Arc::new(MockAutoscalingService::new(vec![AutoScalingGroup::new("a", 1)]));
    let provider = CloudProvider::new(service);
    provider.register_node_groups(&no_ids).await.unwrap();
    assert!(provider.get_node_group("a").is_some());
}

#[tokio::test]
async fn refresh_picks_up_new_desired_capacity() {
    let service = Arc::new(MockAutoscalingService::new(vec![AutoScalingGroup::new("1", 1)]));
    let provider = CloudProvider::new(service.clone());
    provider.register_node_groups(&["1"]).await.unwrap();
    assert_eq!(provider.get_node_group("1").unwrap().target_size(), 1);

    service.set_desired_capacity("1", 2);
    provider.refresh().await.unwrap();

    let ng = provider.get_node_group("1").unwrap();
    assert_eq!(ng.id(), "1");
    assert_eq!(ng.target_size(), 2);
}

#[tokio::test]
async fn refresh_keeps_vanished_groups_stale() {
    let service = Arc::new(MockAutoscalingService::new(vec![
        AutoScalingGroup::new("1", 1),
        AutoScalingGroup::new("2", 2),
    ]));
    let provider = CloudProvider::new(service.clone());
    provider.register_node_groups(&["1", "2"]).await.unwrap();

    service.remove_group("2");
    service.set_desired_capacity("1", 5);
    provider.refresh().await.unwrap();

    assert_eq!(
        sizes(&provider),
        BTreeMap::from([("1".to_string(), 5), ("2".to_string(), 2)])
    );
}

#[tokio::test]
async fn refresh_is_idempotent() {
    let service = Arc::new(MockAutoscalingService::new(vec![
        AutoScalingGroup::new("1", 3),
        AutoScalingGroup::new("2", -1),
    ]));
    let provider = CloudProvider::new(service.clone());
    provider.register_node_groups(&["1", "2"]).await.unwrap();

    provider.refresh().await.unwrap();
    let first = sizes(&provider);
    provider.refresh().await.unwrap();
    assert_eq!(sizes(&provider), first);
    assert_eq!(service.calls().len(), 3);
}

#[tokio::test]
async fn register_from_config_uses_cloud_group_names() {
    let config = SyncConfig::from_toml_str(
        r#"
[provider]
name = "aws"

[[node_groups]]
name = "shared"
cloud_provider_group_name = "asg-shared"

[[node_groups]]
name = "gpu"
cloud_provider_group_name = "asg-gpu"
"#,
    )
    .unwrap();
    config.validate().unwrap();

    let service = Arc::new(MockAutoscalingService::new(vec![AutoScalingGroup::new(
        "asg-shared",
        4,
    )]));
    let provider = CloudProvider::new(service.clone());
    provider.register_from_config(&config).await.unwrap();

    assert_eq!(
        service.calls(),
        vec![vec!["asg-shared".to_string(), "asg-gpu".to_string()]]
    );
    assert_eq!(provider.get_node_group("asg-shared").unwrap().target_size(), 4);
    assert!(provider.get_node_group("asg-gpu").is_none());
}

/// Blocks every describe call until released, then answers with a fixed
/// desired capacity.
struct GatedService {
    gate: Notify,
    entered: Notify,
    desired_capacity: i64,
}

impl AutoscalingService for GatedService {
    fn describe_auto_scaling_groups<'a>(&'a self, names: &'a [String]) -> DescribeFuture<'a> {
        Box::pin(async move {
            self.entered.notify_one();
            self.gate.notified().await;
            Ok(names
                .iter()
                .map(|n| AutoScalingGroup::new(n.clone(), self.desired_capacity))
                .collect())
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reads_do_not_wait_on_remote_call() {
    let service = Arc::new(GatedService {
        gate: Notify::new(),
        entered: Notify::new(),
        desired_capacity: 8,
    });
    let provider = CloudProvider::new(service.clone());

    let registering = provider.clone();
    let handle =
        tokio::spawn(async move { registering.register_node_groups(&["1", "2"]).await });

    // The describe call is in flight; readers still get an answer.
    service.entered.notified().await;
    assert!(provider.node_groups().is_empty());
    assert!(provider.get_node_group("1").is_none());

    service.gate.notify_one();
    handle.await.unwrap().unwrap();

    let groups: Vec<Arc<NodeGroup>> = provider.node_groups();
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|ng| ng.target_size() == 8));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_see_whole_syncs() {
    let ids: Vec<String> = (0..50).map(|i| format!("asg-{i}")).collect();
    let service = Arc::new(MockAutoscalingService::new(
        ids.iter().map(|id| AutoScalingGroup::new(id.clone(), 1)).collect(),
    ));
    let provider = CloudProvider::new(service.clone());
    provider.register_node_groups(ids.as_slice()).await.unwrap();

    let mut readers = Vec::new();
    for _ in 0..4 {
        let provider = provider.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..200 {
                let snapshot = provider.node_groups();
                assert_eq!(snapshot.len(), 50);
                let first = snapshot[0].target_size();
                // Every group moves together, so a snapshot never mixes.
                assert!(snapshot.iter().all(|ng| ng.target_size() == first));
                tokio::task::yield_now().await;
            }
        }));
    }

    for size in 2..20 {
        for id in &ids {
            service.set_desired_capacity(id, size);
        }
        provider.refresh().await.unwrap();
    }

    for reader in readers {
        reader.await.unwrap();
    }
    assert!(provider.node_groups().iter().all(|ng| ng.target_size() == 19));
}

/// Delegates to a mock, but once armed holds the next call's response
/// until released. The response is taken before the hold, so it reflects
/// the backend as it was when the call started.
struct HoldNextCall {
    backend: MockAutoscalingService,
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl HoldNextCall {
    fn new(groups: Vec<AutoScalingGroup>) -> Self {
        Self {
            backend: MockAutoscalingService::new(groups),
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

impl AutoscalingService for HoldNextCall {
    fn describe_auto_scaling_groups<'a>(&'a self, names: &'a [String]) -> DescribeFuture<'a> {
        Box::pin(async move {
            let result = self.backend.describe_auto_scaling_groups(names).await;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            result
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_refresh_does_not_roll_back_later_register() {
    let service = Arc::new(HoldNextCall::new(vec![AutoScalingGroup::new("1", 1)]));
    let provider = CloudProvider::new(service.clone());
    provider.register_node_groups(&["1"]).await.unwrap();

    service.armed.store(true, Ordering::SeqCst);
    let refreshing = provider.clone();
    let refresh = tokio::spawn(async move { refreshing.refresh().await });
    service.entered.notified().await;

    // The refresh holds a response saying 1; the backend has moved on.
    service.backend.set_desired_capacity("1", 7);
    provider.register_node_groups(&["1"]).await.unwrap();
    assert_eq!(provider.get_node_group("1").unwrap().target_size(), 7);

    service.release.notify_one();
    refresh.await.unwrap().unwrap();
    assert_eq!(provider.get_node_group("1").unwrap().target_size(), 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_refreshes_keep_the_newest_response() {
    let service = Arc::new(HoldNextCall::new(vec![AutoScalingGroup::new("1", 1)]));
    let provider = CloudProvider::new(service.clone());
    provider.register_node_groups(&["1"]).await.unwrap();
    service.backend.set_desired_capacity("1", 2);

    service.armed.store(true, Ordering::SeqCst);
    let refreshing = provider.clone();
    let slow = tokio::spawn(async move { refreshing.refresh().await });
    service.entered.notified().await;

    service.backend.set_desired_capacity("1", 3);
    provider.refresh().await.unwrap();
    assert_eq!(provider.get_node_group("1").unwrap().target_size(), 3);

    service.release.notify_one();
    slow.await.unwrap().unwrap();
    assert_eq!(provider.get_node_group("1").unwrap().target_size(), 3);
}
