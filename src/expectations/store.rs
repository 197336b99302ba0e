//! Generic expectation store
//!
//! A concurrent ledger of outstanding create/delete counts, keyed by an
//! arbitrary hashable key. The store knows nothing about clusters or node
//! groups; the router in the parent module derives keys and delegates here.
//!
//! Counts are signed and never clamped: an observation that arrives before
//! its declare call (or a duplicate delivery) pushes the count negative, and
//! satisfaction is defined as "both counts <= 0" so such races are absorbed
//! instead of wedging the key.

use std::fmt::Debug;
use std::hash::Hash;

use dashmap::DashMap;
use tracing::debug;

use crate::{Error, Result};

/// Outstanding create/delete counts for one key
#[derive(Clone, Copy, Debug, Default)]
struct OutstandingCounts {
    /// Creations declared but not yet observed
    adds: i64,
    /// Deletions declared but not yet observed
    dels: i64,
}

impl OutstandingCounts {
    fn satisfied(&self) -> bool {
        self.adds <= 0 && self.dels <= 0
    }
}

/// Thread-safe ledger of outstanding scale expectations
///
/// Each key maps to a pair of signed counts. Both counts of a pair are read
/// and written under the same map shard lock, so a satisfaction query never
/// sees one count mid-update while the other is stale.
pub struct ControllerExpectations<K: Eq + Hash> {
    entries: DashMap<K, OutstandingCounts>,
}

impl<K: Eq + Hash + Clone + Debug> ControllerExpectations<K> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Declare that `adds` creations are now expected for `key`
    ///
    /// Replaces any previously declared creation count for the key; a
    /// pending deletion count is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCount`] if `adds` is negative.
    pub fn expect_creations(&self, key: K, adds: i64) -> Result<()> {
        if adds < 0 {
            return Err(Error::invalid_count(adds));
        }
        self.entries
            .entry(key.clone())
            .and_modify(|counts| counts.adds = adds)
            .or_insert(OutstandingCounts { adds, dels: 0 });
        debug!(key = ?key, adds, "expecting creations");
        Ok(())
    }

    /// Declare that `dels` deletions are now expected for `key`
    ///
    /// Replaces any previously declared deletion count for the key; a
    /// pending creation count is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCount`] if `dels` is negative.
    pub fn expect_deletions(&self, key: K, dels: i64) -> Result<()> {
        if dels < 0 {
            return Err(Error::invalid_count(dels));
        }
        self.entries
            .entry(key.clone())
            .and_modify(|counts| counts.dels = dels)
            .or_insert(OutstandingCounts { adds: 0, dels });
        debug!(key = ?key, dels, "expecting deletions");
        Ok(())
    }

    /// Declare one additional expected deletion for `key`
    ///
    /// Unlike [`Self::expect_deletions`], which records a whole batch at
    /// once, this accumulates: each call raises the pending deletion count
    /// by one. Used when resources are doomed one name at a time, so that
    /// N such declares track N deletions instead of overwriting each other.
    pub fn raise_deletions(&self, key: K) {
        let counts = *self
            .entries
            .entry(key.clone())
            .and_modify(|counts| counts.dels += 1)
            .or_insert(OutstandingCounts { adds: 0, dels: 1 });
        debug!(key = ?key, dels = counts.dels, "expecting one more deletion");
    }

    /// Record one observed creation for `key`
    ///
    /// No-op if the key has no recorded expectation. Decrementing past zero
    /// is allowed; it cannot flip an already-satisfied key back to pending.
    pub fn creation_observed(&self, key: &K) {
        if let Some(mut counts) = self.entries.get_mut(key) {
            counts.adds -= 1;
        }
    }

    /// Record one observed deletion for `key`
    ///
    /// Same no-op and over-decrement semantics as [`Self::creation_observed`].
    pub fn deletion_observed(&self, key: &K) {
        if let Some(mut counts) = self.entries.get_mut(key) {
            counts.dels -= 1;
        }
    }

    /// Check whether all declared expectations for `key` have been observed
    ///
    /// A key with no recorded expectation is vacuously satisfied.
    pub fn satisfied(&self, key: &K) -> bool {
        self.entries
            .get(key)
            .map_or(true, |counts| counts.satisfied())
    }

    /// Drop all bookkeeping for `key`
    ///
    /// The key reads as satisfied afterwards, until a new declare call.
    pub fn delete_expectations(&self, key: &K) {
        if self.entries.remove(key).is_some() {
            debug!(key = ?key, "deleted expectations");
        }
    }
}

impl<K: Eq + Hash + Clone + Debug> Default for ControllerExpectations<K> {
    fn default() -> Self {
        Self::new()
    }
}
