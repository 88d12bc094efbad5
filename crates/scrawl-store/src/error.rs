//! Error types for the store layer.

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The path is empty or contains an empty segment.
    #[error("invalid store path: {0:?}")]
    InvalidPath(String),

    /// A write or push tried to go through a node that is not an object.
    /// For example, pushing into `drawing` after a scalar was set there.
    #[error("node at {0:?} is not an object")]
    NotAnObject(String),

    /// The backing store reported a failure.
    #[error("store backend error: {0}")]
    Backend(String),
}
