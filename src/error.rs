//! Error types for the RayCluster operator

use thiserror::Error;

/// Main error type for expectation-tracking operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A declare call requested a negative expectation count
    ///
    /// This is a logic error in the caller: the reconciler should never
    /// compute a negative number of pods to create or delete. It is surfaced
    /// rather than retried.
    #[error("invalid expectation count: {count}")]
    InvalidCount {
        /// The rejected count
        count: i64,
    },

    /// A resource name has too few segments to attribute to a node group
    ///
    /// Pod names follow `{cluster}-head-{suffix}` or
    /// `{cluster}-worker-{group}-{suffix}`; anything with fewer than two
    /// dash-separated segments cannot be attributed to any group.
    #[error("malformed resource name: {name}")]
    MalformedName {
        /// The name that failed to parse
        name: String,
    },
}

impl Error {
    /// Create an invalid-count error for the given count
    pub fn invalid_count(count: i64) -> Self {
        Self::InvalidCount { count }
    }

    /// Create a malformed-name error for the given resource name
    pub fn malformed_name(name: impl Into<String>) -> Self {
        Self::MalformedName { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Story: negative declare counts surface as logic errors
    ///
    /// The reconciler computes how many pods to create or delete before
    /// declaring them. A negative count means the computation is wrong, and
    /// the error message carries the offending value for the log line.
    #[test]
    fn story_negative_counts_are_reported_with_their_value() {
        let err = Error::invalid_count(-3);
        assert!(err.to_string().contains("invalid expectation count"));
        assert!(err.to_string().contains("-3"));

        match err {
            Error::InvalidCount { count } => assert_eq!(count, -3),
            _ => panic!("Expected InvalidCount variant"),
        }
    }

    /// Story: unattributable pod names are reported with the name
    ///
    /// When the reconciler asks to track deletion of a pod whose name does
    /// not follow the naming convention, the error names the pod so the
    /// operator log points at the offending resource.
    #[test]
    fn story_malformed_names_are_reported_with_the_name() {
        let err = Error::malformed_name("bad");
        assert!(err.to_string().contains("malformed resource name"));
        assert!(err.to_string().contains("bad"));

        // Constructor accepts both &str and String
        let dynamic = format!("pod-{}", 7);
        match Error::malformed_name(dynamic) {
            Error::MalformedName { name } => assert_eq!(name, "pod-7"),
            _ => panic!("Expected MalformedName variant"),
        }
    }
}
