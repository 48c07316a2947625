//! Node store errors

use thiserror::Error;

/// Result type for node store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Node store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Node JSON is missing a required attribute or is not an object
    #[error("Malformed node: {0}")]
    MalformedNode(String),

    /// A node id was re-used with a different type
    #[error("Node '{id}' has type '{existing}' and cannot become '{requested}'")]
    TypeChanged {
        id: String,
        existing: String,
        requested: String,
    },

    /// A field resolver failed; the type's previous cache entry is kept
    #[error("Resolver failed for node '{id}' of type '{node_type}': {reason}")]
    ResolverFailed {
        id: String,
        node_type: String,
        reason: String,
    },
}
