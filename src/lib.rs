//! Expectation tracking for a RayCluster Kubernetes operator
//!
//! A RayCluster controller is level-triggered: each reconcile pass compares
//! the desired cluster shape (one head pod plus named worker groups) against
//! what the informer cache reports, then creates or deletes pods to close the
//! gap. The informer cache is eventually consistent, so right after the
//! controller issues an action the cache still shows the old world. Acting on
//! that stale view produces duplicate creates and deletes.
//!
//! This crate is the mitigation: before issuing N creates or deletes for a
//! group, the reconciler declares them here; the watch-event dispatcher
//! reports each arriving add/remove back; and the reconciler gates every
//! scaling decision on the satisfaction query. An unsatisfied group means
//! "your own actions have not landed in the cache yet - do not act on it".
//!
//! # Modules
//!
//! - [`expectations`] - Per-group scale expectation bookkeeping
//! - [`error`] - Error types for the operator
//!
//! All state is process-local. A freshly started controller has no
//! outstanding expectations and treats every group as satisfied until it
//! issues actions of its own.

#![deny(missing_docs)]

pub mod error;
pub mod expectations;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
