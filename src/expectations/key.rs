//! Bookkeeping keys for scale expectations
//!
//! Expectations are tracked per node group, so every store operation needs a
//! key that identifies one group of one cluster. Keys are composite structs
//! rather than concatenated strings: a dedicated enum variant marks the head
//! group, which makes collisions between the head marker and a user-chosen
//! worker group name structurally impossible.

use crate::{Error, Result};

/// Identity of a RayCluster resource: namespace plus cluster name
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RayClusterRef {
    /// Namespace the cluster lives in
    pub namespace: String,
    /// Name of the RayCluster resource
    pub name: String,
}

impl RayClusterRef {
    /// Create a cluster reference from namespace and name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RayClusterRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A node group within a RayCluster
///
/// The head group is a distinguished variant; worker groups carry their
/// user-chosen name, lowercased on construction so that declare and observe
/// paths can never disagree on case.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeGroup {
    /// The single-member head group
    Head,
    /// A named worker group (name is case-normalized)
    Worker(String),
}

impl NodeGroup {
    /// Create a worker group, normalizing the name to lowercase
    pub fn worker(name: &str) -> Self {
        Self::Worker(name.to_lowercase())
    }
}

impl std::fmt::Display for NodeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Head => write!(f, "head"),
            Self::Worker(name) => write!(f, "worker/{name}"),
        }
    }
}

/// Expectation-store key: one node group of one cluster
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupKey {
    /// Owning cluster
    pub cluster: RayClusterRef,
    /// Node group within the cluster
    pub group: NodeGroup,
}

impl GroupKey {
    /// Build the key for a cluster's head group
    pub fn head(cluster: &RayClusterRef) -> Self {
        Self {
            cluster: cluster.clone(),
            group: NodeGroup::Head,
        }
    }

    /// Build the key for a named worker group of a cluster
    pub fn worker(cluster: &RayClusterRef, group: &str) -> Self {
        Self {
            cluster: cluster.clone(),
            group: NodeGroup::worker(group),
        }
    }

    /// Build the key for an already-normalized group
    pub fn for_group(cluster: &RayClusterRef, group: &NodeGroup) -> Self {
        Self {
            cluster: cluster.clone(),
            group: group.clone(),
        }
    }

    /// Attribute a pod name to the node group that owns it
    ///
    /// Pod names follow the operator's naming convention:
    ///
    /// - head   : `{cluster}-head-{suffix}`
    /// - worker : `{cluster}-worker-{group}-{suffix}`
    ///
    /// Attribution goes by segment count alone. Fewer than two segments is a
    /// parse failure; more than three means the third segment names a worker
    /// group; otherwise the pod belongs to the head group.
    pub fn parse(namespace: &str, resource_name: &str) -> Result<Self> {
        let segments: Vec<&str> = resource_name.split('-').collect();
        if segments.len() < 2 {
            return Err(Error::malformed_name(resource_name));
        }

        let cluster = RayClusterRef::new(namespace, segments[0]);
        let group = if segments.len() > 3 {
            NodeGroup::worker(segments[2])
        } else {
            NodeGroup::Head
        };

        Ok(Self { cluster, group })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Story: head pod names resolve to the head group
    ///
    /// A head pod name has exactly one segment between the cluster name and
    /// the random suffix, so attribution lands on the head group.
    #[test]
    fn story_head_pod_name_attributes_to_head_group() {
        let key = GroupKey::parse("default", "mycluster-head-abc123").unwrap();
        assert_eq!(key.cluster, RayClusterRef::new("default", "mycluster"));
        assert_eq!(key.group, NodeGroup::Head);
    }

    /// Story: worker pod names carry the group name as the third segment
    #[test]
    fn story_worker_pod_name_attributes_to_its_group() {
        let key = GroupKey::parse("default", "mycluster-worker-small-abc123").unwrap();
        assert_eq!(key.cluster, RayClusterRef::new("default", "mycluster"));
        assert_eq!(key.group, NodeGroup::Worker("small".to_string()));
    }

    /// Story: names with too few segments cannot be attributed
    ///
    /// A single-segment name carries no group information at all. The
    /// deletion-declare path surfaces this; the watch path drops it.
    #[test]
    fn story_single_segment_name_fails_to_parse() {
        let err = GroupKey::parse("default", "bad").unwrap_err();
        match err {
            Error::MalformedName { name } => assert_eq!(name, "bad"),
            _ => panic!("Expected MalformedName variant"),
        }
    }

    /// Story: worker group names are case-normalized everywhere
    ///
    /// The reconciler may declare with the group name as spelled in the CRD
    /// while pod names carry the lowercased form. Both must derive the same
    /// key, or declared expectations could never be observed.
    #[test]
    fn story_group_names_normalize_to_one_key() {
        let cluster = RayClusterRef::new("default", "mycluster");
        let declared = GroupKey::worker(&cluster, "GpuWorkers");
        let observed = GroupKey::parse("default", "mycluster-worker-gpuworkers-xyz").unwrap();
        assert_eq!(declared, observed);
    }

    /// Story: the head marker cannot collide with a worker group name
    ///
    /// Even a worker group literally named "head" derives a different key
    /// than the head group, because the head is its own enum variant.
    #[test]
    fn story_head_marker_is_collision_free() {
        let cluster = RayClusterRef::new("default", "mycluster");
        assert_ne!(GroupKey::head(&cluster), GroupKey::worker(&cluster, "head"));
        assert_ne!(GroupKey::head(&cluster), GroupKey::worker(&cluster, "HEAD"));
    }

    /// Story: identical group names in different clusters stay independent
    #[test]
    fn story_same_group_name_in_two_clusters_derives_two_keys() {
        let a = RayClusterRef::new("default", "alpha");
        let b = RayClusterRef::new("default", "beta");
        assert_ne!(GroupKey::worker(&a, "small"), GroupKey::worker(&b, "small"));

        // Same cluster name in two namespaces is also distinct
        let c = RayClusterRef::new("other", "alpha");
        assert_ne!(GroupKey::worker(&a, "small"), GroupKey::worker(&c, "small"));
    }
}
