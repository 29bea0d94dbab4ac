//! corral-state: in-memory cluster snapshot for the Corral placement engine.
//!
//! Models jobs, machines, and the observed machine → jobs assignment
//! ([`AgentState`]). A [`ClusterState`] is an immutable-by-borrow view
//! of the cluster that the scheduler reads; building and refreshing it
//! is the caller's job.
//!
//! # Architecture
//!
//! ```text
//! ClusterState
//!   ├── machines  (MachineId → MachineState)
//!   ├── jobs      (JobId → Job, scheduled or not)
//!   └── agents    (MachineId → AgentState, one per machine)
//!       └── jobs  (JobId → Job scheduled on that machine)
//! ```
//!
//! The store-facing wire form is [`ClusterSnapshot`] (JSON).

pub mod cluster;
pub mod error;
pub mod types;

pub use cluster::{ClusterSnapshot, ClusterState};
pub use error::{StateError, StateResult};
pub use types::*;
