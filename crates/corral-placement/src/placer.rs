//! Batch placement of unscheduled jobs.
//!
//! Given a snapshot, the placer decides a machine for every job that no
//! agent holds yet:
//! 1. Jobs are visited in name order
//! 2. Each decision is recorded in a private working copy, so later jobs
//!    see the load added by earlier ones
//! 3. Failures are collected, not retried
//!
//! The caller's snapshot is left untouched; [`PlacementPlan::apply`]
//! commits the plan once the caller has persisted it.

use tracing::{debug, info, warn};

use corral_state::{ClusterState, JobId, StateError, StateResult};

use crate::error::PlacementError;
use crate::scheduler::{Decision, Scheduler};

/// Placement decisions for one batch.
#[derive(Debug, Default)]
pub struct PlacementPlan {
    /// Placed jobs, in decision order.
    pub assignments: Vec<(JobId, Decision)>,
    /// Jobs that could not be placed and why.
    pub unplaced: Vec<(JobId, PlacementError)>,
}

impl PlacementPlan {
    /// True when every pending job received a decision.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Record every decision of the plan in `state`.
    ///
    /// All-or-nothing: if any job or target machine is missing from
    /// `state`, nothing is written.
    pub fn apply(&self, state: &mut ClusterState) -> StateResult<()> {
        for (job, decision) in &self.assignments {
            if state.job(job).is_none() {
                return Err(StateError::UnknownJob(job.clone()));
            }
            if state.agent(&decision.machine_id).is_none() {
                return Err(StateError::UnknownMachine(decision.machine_id.clone()));
            }
        }

        for (job, decision) in &self.assignments {
            state.schedule_job(job, &decision.machine_id)?;
        }
        Ok(())
    }
}

/// Decide a machine for every unscheduled job in `state`.
pub fn place_unscheduled<S>(scheduler: &S, state: &ClusterState) -> PlacementPlan
where
    S: Scheduler + ?Sized,
{
    let mut working = state.clone();
    let pending: Vec<JobId> = working
        .unscheduled_jobs()
        .into_iter()
        .map(|job| job.name.clone())
        .collect();

    let mut plan = PlacementPlan::default();

    for name in pending {
        let outcome = match working.job(&name) {
            Some(job) => scheduler.decide(&working, job),
            None => continue,
        };

        match outcome {
            Ok(decision) => {
                if let Err(e) = working.schedule_job(&name, &decision.machine_id) {
                    warn!(
                        job = %name,
                        error = %e,
                        "decision named a machine outside the snapshot"
                    );
                    plan.unplaced.push((name, e.into()));
                    continue;
                }
                debug!(
                    job = %name,
                    machine = %decision.machine_id,
                    policy = scheduler.name(),
                    "job placed"
                );
                plan.assignments.push((name, decision));
            }
            Err(e) => {
                warn!(job = %name, error = %e, "could not place job");
                plan.unplaced.push((name, e));
            }
        }
    }

    info!(
        placed = plan.assignments.len(),
        unplaced = plan.unplaced.len(),
        "batch placement computed"
    );
    plan
}
