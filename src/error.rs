//! Error types for context tree operations.

use thiserror::Error;

use crate::tree::NodeId;

/// Result type alias for context tree operations.
pub type Result<T> = std::result::Result<T, CtwError>;

/// Errors that can occur while building, updating or persisting a tree.
#[derive(Error, Debug)]
pub enum CtwError {
    /// The context doesn't hold exactly `depth` bits.
    #[error("depth mismatch: expected a context of {expected} bits, got {actual}")]
    DepthMismatch { expected: usize, actual: usize },

    /// A bit or context element other than 0 or 1.
    #[error("invalid bit value {0}, expected 0 or 1")]
    InvalidBit(u8),

    /// The arena can't hold the nodes the update would create.
    #[error("node capacity exceeded: {required} nodes required, capacity is {capacity}")]
    CapacityExceeded { capacity: usize, required: usize },

    /// The root count would overflow.
    #[error("observation limit reached, the root count would overflow")]
    ObservationLimit,

    /// Count or probability bookkeeping diverged, this is a bug.
    #[error("invariant violated at node {node}: {detail}")]
    InvariantViolation { node: NodeId, detail: String },

    /// Rejected tree configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Rejected snapshot.
    #[error("invalid snapshot: {0}")]
    Snapshot(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
