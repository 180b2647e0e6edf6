//! The remote describe-by-name seam.
//!
//! [`AutoscalingService`] is the only way the registry talks to the
//! backend. Transport, authentication, timeouts and retries live behind
//! it; the registry treats every failure as opaque.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use asgsync_core::provider_id;

use crate::error::CloudResult;

/// Boxed future alias for describe results.
pub type DescribeFuture<'a> =
    Pin<Box<dyn Future<Output = CloudResult<Vec<AutoScalingGroup>>> + Send + 'a>>;

/// Describes auto scaling groups by name, injected for testability.
pub trait AutoscalingService: Send + Sync {
    /// Describe the named groups in one batched call.
    ///
    /// Names the backend does not know are omitted from the result rather
    /// than reported as errors.
    fn describe_auto_scaling_groups<'a>(&'a self, names: &'a [String]) -> DescribeFuture<'a>;
}

/// One auto scaling group as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AutoScalingGroup {
    #[serde(rename = "AutoScalingGroupName")]
    pub name: String,
    pub desired_capacity: i64,
    pub min_size: i64,
    pub max_size: i64,
    pub instances: Vec<Instance>,
}

impl AutoScalingGroup {
    pub fn new(name: impl Into<String>, desired_capacity: i64) -> Self {
        Self {
            name: name.into(),
            desired_capacity,
            ..Default::default()
        }
    }
}

/// An instance inside an auto scaling group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Instance {
    pub instance_id: String,
    pub availability_zone: String,
}

impl Instance {
    pub fn new(availability_zone: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            availability_zone: availability_zone.into(),
        }
    }

    /// The `aws:///<zone>/<instance-id>` form used by cluster nodes.
    pub fn provider_id(&self) -> String {
        provider_id::encode(&self.availability_zone, &self.instance_id)
    }
}
