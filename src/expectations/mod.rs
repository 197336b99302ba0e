//! Per-group scale expectation bookkeeping
//!
//! The reconciler must not trust the informer cache for a node group while
//! its own creates or deletes are still in flight. This module tracks, per
//! (cluster, group), how many creations and deletions the controller has
//! announced but not yet seen arrive through the watch stream.
//!
//! # Flow
//!
//! 1. Before issuing N creates (or deletes) for a group, the reconciler
//!    declares them via the `expect_*` operations.
//! 2. The watch-event dispatcher reports every pod add/remove through
//!    [`ScaleExpectations::observed`], which decrements the matching count.
//! 3. Before acting on a group, the reconciler checks `head_satisfied` /
//!    `worker_satisfied` and defers the group while unsatisfied; the same
//!    watch events that satisfy it also requeue the cluster.
//!
//! # Synchronization
//!
//! Two independent domains: the expectation store shards its own locking
//! per key, and the membership index (which clusters declared which groups,
//! kept so `delete_all` can enumerate them) sits behind its own mutex. The
//! index is advisory cleanup bookkeeping only; satisfaction always queries
//! the store directly.

mod key;
mod store;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::Result;

pub use key::{GroupKey, NodeGroup, RayClusterRef};
pub use store::ControllerExpectations;

/// A watched pod lifecycle event kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// The pod appeared in the informer cache
    Create,
    /// The pod disappeared from the informer cache
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "Create"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

/// Scale expectation tracking consumed by the reconciler and watch dispatcher
///
/// The reconciler calls the `expect_*`, `*_satisfied` and `delete_*`
/// operations; the watch dispatcher calls [`Self::observed`]. Implementations
/// must be safe to share across both without external locking.
pub trait ScaleExpectations: Send + Sync {
    /// Declare `adds` expected head pod creations for `cluster`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidCount`] if `adds` is negative.
    fn expect_head_creations(&self, cluster: &RayClusterRef, adds: i64) -> Result<()>;

    /// Declare `dels` expected head pod deletions for `cluster`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidCount`] if `dels` is negative.
    fn expect_head_deletions(&self, cluster: &RayClusterRef, dels: i64) -> Result<()>;

    /// Declare `adds` expected pod creations for a worker group
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidCount`] if `adds` is negative.
    fn expect_worker_creations(&self, cluster: &RayClusterRef, group: &str, adds: i64)
        -> Result<()>;

    /// Declare `dels` expected pod deletions for a worker group
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidCount`] if `dels` is negative.
    fn expect_worker_deletions(&self, cluster: &RayClusterRef, group: &str, dels: i64)
        -> Result<()>;

    /// Declare one expected deletion for a pod identified by name
    ///
    /// The owning cluster and group are recovered from the pod name. Used
    /// when the reconciler deletes a specific named pod rather than scaling
    /// a group by a count; successive calls for pods of the same group
    /// accumulate, one pending deletion each.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedName`] if the name has fewer than
    /// two dash-separated segments.
    fn expect_resource_deletion(&self, namespace: &str, resource_name: &str) -> Result<()>;

    /// Record a watched pod event, attributing it to its group by name
    ///
    /// Unattributable names are dropped silently: one malformed event must
    /// never interrupt watch delivery.
    fn observed(&self, namespace: &str, resource_name: &str, action: Action);

    /// Record a watched event already known to belong to the head group
    fn observed_head(&self, cluster: &RayClusterRef, action: Action);

    /// Record a watched event already known to belong to a worker group
    fn observed_worker(&self, cluster: &RayClusterRef, group: &str, action: Action);

    /// Check whether the head group's expectations are all observed
    fn head_satisfied(&self, cluster: &RayClusterRef) -> bool;

    /// Check whether a worker group's expectations are all observed
    fn worker_satisfied(&self, cluster: &RayClusterRef, group: &str) -> bool;

    /// Drop all expectations for every group of `cluster`
    fn delete_all(&self, cluster: &RayClusterRef);

    /// Drop the head group's expectations for `cluster`
    fn delete_head(&self, cluster: &RayClusterRef);

    /// Drop one worker group's expectations for `cluster`
    fn delete_worker(&self, cluster: &RayClusterRef, group: &str);
}

/// Scale expectation tracker for RayCluster resources
///
/// Routes cluster/group-level intents to the generic expectation store and
/// keeps the per-cluster membership index that powers bulk cleanup.
pub struct RayClusterExpectations {
    store: ControllerExpectations<GroupKey>,
    groups: Mutex<HashMap<RayClusterRef, HashSet<NodeGroup>>>,
}

impl RayClusterExpectations {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self {
            store: ControllerExpectations::new(),
            groups: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the membership index, recovering from poisoning
    ///
    /// The index holds plain collections; a panic in another thread cannot
    /// leave them in a state worth refusing to read.
    fn index(&self) -> MutexGuard<'_, HashMap<RayClusterRef, HashSet<NodeGroup>>> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record that `cluster` has live bookkeeping for `group`
    fn record_group(&self, cluster: &RayClusterRef, group: &NodeGroup) {
        self.index()
            .entry(cluster.clone())
            .or_default()
            .insert(group.clone());
    }

    fn dispatch(&self, key: &GroupKey, action: Action) {
        match action {
            Action::Create => self.store.creation_observed(key),
            Action::Delete => self.store.deletion_observed(key),
        }
    }
}

impl ScaleExpectations for RayClusterExpectations {
    fn expect_head_creations(&self, cluster: &RayClusterRef, adds: i64) -> Result<()> {
        self.record_group(cluster, &NodeGroup::Head);
        self.store.expect_creations(GroupKey::head(cluster), adds)
    }

    fn expect_head_deletions(&self, cluster: &RayClusterRef, dels: i64) -> Result<()> {
        self.record_group(cluster, &NodeGroup::Head);
        self.store.expect_deletions(GroupKey::head(cluster), dels)
    }

    fn expect_worker_creations(
        &self,
        cluster: &RayClusterRef,
        group: &str,
        adds: i64,
    ) -> Result<()> {
        let key = GroupKey::worker(cluster, group);
        self.record_group(cluster, &key.group);
        self.store.expect_creations(key, adds)
    }

    fn expect_worker_deletions(
        &self,
        cluster: &RayClusterRef,
        group: &str,
        dels: i64,
    ) -> Result<()> {
        let key = GroupKey::worker(cluster, group);
        self.record_group(cluster, &key.group);
        self.store.expect_deletions(key, dels)
    }

    fn expect_resource_deletion(&self, namespace: &str, resource_name: &str) -> Result<()> {
        let key = GroupKey::parse(namespace, resource_name)?;
        self.record_group(&key.cluster, &key.group);
        // Doomed pods are declared one name at a time, so this accumulates
        // rather than replacing like the bulk group-scale declares.
        self.store.raise_deletions(key);
        Ok(())
    }

    fn observed(&self, namespace: &str, resource_name: &str, action: Action) {
        match GroupKey::parse(namespace, resource_name) {
            Ok(key) => match &key.group {
                NodeGroup::Head => self.observed_head(&key.cluster, action),
                NodeGroup::Worker(group) => self.observed_worker(&key.cluster, group, action),
            },
            Err(_) => {
                // Cannot be attributed to any group; must not interrupt the
                // watch delivery path.
                debug!(namespace, name = %resource_name, %action, "dropping unattributable pod event");
            }
        }
    }

    fn observed_head(&self, cluster: &RayClusterRef, action: Action) {
        self.dispatch(&GroupKey::head(cluster), action);
    }

    fn observed_worker(&self, cluster: &RayClusterRef, group: &str, action: Action) {
        self.dispatch(&GroupKey::worker(cluster, group), action);
    }

    fn head_satisfied(&self, cluster: &RayClusterRef) -> bool {
        self.store.satisfied(&GroupKey::head(cluster))
    }

    fn worker_satisfied(&self, cluster: &RayClusterRef, group: &str) -> bool {
        self.store.satisfied(&GroupKey::worker(cluster, group))
    }

    fn delete_all(&self, cluster: &RayClusterRef) {
        let mut index = self.index();
        let Some(groups) = index.remove(cluster) else {
            return;
        };
        for group in &groups {
            self.store
                .delete_expectations(&GroupKey::for_group(cluster, group));
        }
        debug!(cluster = %cluster, groups = groups.len(), "deleted all expectations");
    }

    fn delete_head(&self, cluster: &RayClusterRef) {
        let mut index = self.index();
        let Some(groups) = index.get_mut(cluster) else {
            return;
        };
        if groups.remove(&NodeGroup::Head) {
            self.store.delete_expectations(&GroupKey::head(cluster));
        }
    }

    fn delete_worker(&self, cluster: &RayClusterRef, group: &str) {
        let key = GroupKey::worker(cluster, group);
        let mut index = self.index();
        let Some(groups) = index.get_mut(cluster) else {
            return;
        };
        if groups.remove(&key.group) {
            self.store.delete_expectations(&key);
        }
    }
}

impl Default for RayClusterExpectations {
    fn default() -> Self {
        Self::new()
    }
}
