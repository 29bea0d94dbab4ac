//! Placement policies.
//!
//! A [`Scheduler`] turns a cluster snapshot and a job into a single
//! target machine. Implementations hold no state between calls: the same
//! snapshot and job always produce the same answer, so independent
//! replicas evaluating one snapshot agree without coordinating. Mutual
//! exclusion belongs to whoever commits the decision, not here.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use corral_state::{ClusterState, Job, MachineId};

use crate::error::{PlacementError, PlacementResult};
use crate::ranking::rank_agents;

/// The machine chosen to host a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub machine_id: MachineId,
}

/// A placement policy.
pub trait Scheduler: Send + Sync {
    /// Short policy name, as used in configuration.
    fn name(&self) -> &'static str;

    /// Choose the machine that should host `job`.
    ///
    /// `state` is borrowed for the whole call; callers refresh their
    /// snapshot between calls, never during one.
    fn decide(&self, state: &ClusterState, job: &Job) -> PlacementResult<Decision>;
}

/// Places each job on the machine with the fewest scheduled jobs, ties
/// broken by the lowest machine id.
///
/// Job attributes other than the name are ignored.
#[derive(Debug, Clone)]
pub struct LeastLoadedScheduler {
    check_consistency: bool,
}

impl LeastLoadedScheduler {
    pub fn new() -> Self {
        Self {
            check_consistency: true,
        }
    }

    /// Enable or disable the duplicate-assignment check run before every
    /// decision.
    pub fn with_consistency_check(mut self, enabled: bool) -> Self {
        self.check_consistency = enabled;
        self
    }
}

impl Default for LeastLoadedScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for LeastLoadedScheduler {
    fn name(&self) -> &'static str {
        "least-loaded"
    }

    fn decide(&self, state: &ClusterState, job: &Job) -> PlacementResult<Decision> {
        if self.check_consistency {
            state.check_assignments()?;
        }

        let ranked = rank_agents(state.agents());
        let Some(best) = ranked.first() else {
            warn!(job = %job.name, "no machines available");
            return Err(PlacementError::NoMachinesAvailable {
                job: job.name.clone(),
            });
        };

        debug!(
            job = %job.name,
            machine = %best.machine_id(),
            load = best.job_count(),
            candidates = ranked.len(),
            "placement decided"
        );

        Ok(Decision {
            machine_id: best.machine_id().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_state::{AgentState, MachineState, StateError};

    fn make_cluster(machines: &[&str]) -> ClusterState {
        ClusterState::new(Vec::new(), machines.iter().map(|id| MachineState::new(*id))).unwrap()
    }

    #[test]
    fn no_machines_is_an_error() {
        let state = make_cluster(&[]);
        let result = LeastLoadedScheduler::new().decide(&state, &Job::new("foo.service"));

        match result {
            Err(PlacementError::NoMachinesAvailable { job }) => assert_eq!(job, "foo.service"),
            other => panic!("expected NoMachinesAvailable, got {other:?}"),
        }
    }

    #[test]
    fn picks_first_machine_when_all_idle() {
        let state = make_cluster(&["YYY", "XXX"]);
        let dec = LeastLoadedScheduler::new()
            .decide(&state, &Job::new("foo.service"))
            .unwrap();

        assert_eq!(
            dec,
            Decision {
                machine_id: "XXX".to_string()
            }
        );
    }

    #[test]
    fn prefers_less_loaded_machine_over_lower_id() {
        let mut state = ClusterState::new(
            vec![Job::new("a.service"), Job::new("b.service")],
            vec![MachineState::new("aaa"), MachineState::new("zzz")],
        )
        .unwrap();
        state.schedule_job("a.service", "aaa").unwrap();

        let dec = LeastLoadedScheduler::new()
            .decide(&state, &Job::new("b.service"))
            .unwrap();
        assert_eq!(dec.machine_id, "zzz");
    }

    #[test]
    fn inconsistent_snapshot_is_reported_not_repaired() {
        let mut a = AgentState::new(MachineState::new("m1"));
        a.schedule(Job::new("dup.service"));
        let mut b = AgentState::new(MachineState::new("m2"));
        b.schedule(Job::new("dup.service"));

        let state = ClusterState::from_parts(
            vec![Job::new("dup.service")],
            vec![MachineState::new("m1"), MachineState::new("m2")],
            vec![a, b],
        )
        .unwrap();
        let before = state.clone();

        let err = LeastLoadedScheduler::new()
            .decide(&state, &Job::new("new.service"))
            .unwrap_err();

        assert!(matches!(
            err,
            PlacementError::InconsistentState(StateError::DuplicateAssignment { .. })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn consistency_check_can_be_disabled() {
        let mut a = AgentState::new(MachineState::new("m1"));
        a.schedule(Job::new("dup.service"));
        let mut b = AgentState::new(MachineState::new("m2"));
        b.schedule(Job::new("dup.service"));
        let state = ClusterState::from_parts(
            vec![Job::new("dup.service")],
            vec![
                MachineState::new("m1"),
                MachineState::new("m2"),
                MachineState::new("m3"),
            ],
            vec![a, b],
        )
        .unwrap();

        let sched = LeastLoadedScheduler::new().with_consistency_check(false);
        let dec = sched.decide(&state, &Job::new("x.service")).unwrap();
        assert_eq!(dec.machine_id, "m3");
    }

    #[test]
    fn agent_job_missing_from_job_set_does_not_block_decision() {
        let mut a = AgentState::new(MachineState::new("m1"));
        a.schedule(Job::new("stray.service"));
        let state = ClusterState::from_parts(
            Vec::new(),
            vec![MachineState::new("m1"), MachineState::new("m2")],
            vec![a],
        )
        .unwrap();

        let dec = LeastLoadedScheduler::new()
            .decide(&state, &Job::new("x.service"))
            .unwrap();
        assert_eq!(dec.machine_id, "m2");
    }

    #[test]
    fn usable_as_trait_object() {
        let sched: Box<dyn Scheduler> = Box::new(LeastLoadedScheduler::default());
        assert_eq!(sched.name(), "least-loaded");

        let state = make_cluster(&["only"]);
        let dec = sched.decide(&state, &Job::new("foo.service")).unwrap();
        assert_eq!(dec.machine_id, "only");
    }
}
