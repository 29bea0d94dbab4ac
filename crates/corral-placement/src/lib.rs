//! Corral placement engine: least-loaded job scheduling.
//!
//! This crate decides which machine should host a job, given a
//! [`ClusterState`](corral_state::ClusterState) snapshot. It does NOT
//! persist decisions or start work on machines (that's the
//! reconciliation layer). Decisions are pure functions of the snapshot,
//! so any number of replicas computing one reach the same answer.
//!
//! # Components
//!
//! - **`ranking`**: Deterministic candidate order (load, then machine id)
//! - **`scheduler`**: `Scheduler` trait and the least-loaded policy
//! - **`placer`**: Batch placement of every unscheduled job
//! - **`config`**: TOML configuration and scheduler construction

pub mod config;
pub mod error;
pub mod placer;
pub mod ranking;
pub mod scheduler;

pub use config::{PlacementConfig, SchedulerConfig, SchedulingPolicy};
pub use error::{PlacementError, PlacementResult};
pub use placer::{PlacementPlan, place_unscheduled};
pub use ranking::{LoadRank, compare_agents, load_ranking, rank_agents, sort_agent_states};
pub use scheduler::{Decision, LeastLoadedScheduler, Scheduler};
