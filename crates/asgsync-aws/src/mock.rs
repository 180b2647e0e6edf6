//! In-memory [`AutoscalingService`] for tests and local runs.
//!
//! Holds a fixed set of groups, optionally fails every call with a
//! configured error, and records the names requested by each call.

use std::sync::Mutex;

use crate::error::CloudError;
use crate::service::{AutoScalingGroup, AutoscalingService, DescribeFuture};

#[derive(Debug, Default)]
pub struct MockAutoscalingService {
    groups: Mutex<Vec<AutoScalingGroup>>,
    error: Mutex<Option<CloudError>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockAutoscalingService {
    pub fn new(groups: Vec<AutoScalingGroup>) -> Self {
        Self {
            groups: Mutex::new(groups),
            ..Default::default()
        }
    }

    /// A service whose every call fails with `error`.
    pub fn failing(error: CloudError) -> Self {
        let service = Self::default();
        service.set_error(Some(error));
        service
    }

    pub fn set_groups(&self, groups: Vec<AutoScalingGroup>) {
        *self.groups.lock().expect("mock groups lock") = groups;
    }

    pub fn set_error(&self, error: Option<CloudError>) {
        *self.error.lock().expect("mock error lock") = error;
    }

    /// Change one group's desired capacity. Returns false if absent.
    pub fn set_desired_capacity(&self, name: &str, desired_capacity: i64) -> bool {
        let mut groups = self.groups.lock().expect("mock groups lock");
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => {
                group.desired_capacity = desired_capacity;
                true
            }
            None => false,
        }
    }

    /// Drop a group from the backend's view.
    pub fn remove_group(&self, name: &str) {
        self.groups
            .lock()
            .expect("mock groups lock")
            .retain(|g| g.name != name);
    }

    /// Names requested by each call so far, oldest first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().expect("mock calls lock").clone()
    }

    fn describe(&self, names: &[String]) -> Result<Vec<AutoScalingGroup>, CloudError> {
        self.calls
            .lock()
            .expect("mock calls lock")
            .push(names.to_vec());

        if let Some(err) = self.error.lock().expect("mock error lock").clone() {
            return Err(err);
        }

        // An empty name list describes every group, as the real API does.
        let groups = self.groups.lock().expect("mock groups lock");
        Ok(groups
            .iter()
            .filter(|g| names.is_empty() || names.contains(&g.name))
            .cloned()
            .collect())
    }
}

impl AutoscalingService for MockAutoscalingService {
    fn describe_auto_scaling_groups<'a>(&'a self, names: &'a [String]) -> DescribeFuture<'a> {
        let result = self.describe(names);
        Box::pin(async move { result })
    }
}
