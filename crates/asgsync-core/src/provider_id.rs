//! Provider IDs — the canonical identity of a cloud instance.
//!
//! Cluster nodes carry a provider ID of the form
//! `aws:///<availability-zone>/<instance-id>`. The triple slash is literal
//! (the URI authority is empty). Encoding does no escaping and no
//! validation, so malformed zones or instance IDs produce a malformed but
//! well-formed-looking identifier.

use std::fmt;

/// Scheme prefix shared by every encoded provider ID.
pub const PREFIX: &str = "aws:///";

/// Encode an (availability zone, instance id) pair.
pub fn encode(zone: &str, instance_id: &str) -> String {
    format!("{PREFIX}{zone}/{instance_id}")
}

/// A decoded provider ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderId {
    pub zone: String,
    pub instance_id: String,
}

impl ProviderId {
    pub fn new(zone: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            instance_id: instance_id.into(),
        }
    }

    /// Decode `aws:///<zone>/<instance-id>`.
    ///
    /// The instance ID is everything after the last `/` and must be
    /// non-empty. Returns `None` for any other shape.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix(PREFIX)?;
        let (zone, instance_id) = rest.rsplit_once('/')?;
        if instance_id.is_empty() || zone.contains('/') {
            return None;
        }
        Some(Self::new(zone, instance_id))
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(&self.zone, &self.instance_id))
    }
}
