//! Error types for the cluster snapshot.

use thiserror::Error;

/// Result type alias for snapshot operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors raised while building or querying a [`ClusterState`](crate::ClusterState).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid machine: {0}")]
    InvalidMachine(String),

    #[error("invalid job: {0}")]
    InvalidJob(String),

    #[error("duplicate {kind}: {id}")]
    Duplicate { kind: &'static str, id: String },

    #[error("unknown machine: {0}")]
    UnknownMachine(String),

    #[error("unknown job: {0}")]
    UnknownJob(String),

    #[error("job {job} is scheduled on more than one machine: {machines:?}")]
    DuplicateAssignment { job: String, machines: Vec<String> },

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),
}
