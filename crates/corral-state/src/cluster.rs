//! Cluster snapshot: machines, jobs, and the machine → jobs mapping.
//!
//! A [`ClusterState`] is built fresh from the external store before a
//! scheduling pass (or kept current from its watch stream through the
//! incremental update methods) and handed to the scheduler by shared
//! reference. Every known machine has an [`AgentState`], including
//! machines with no scheduled work, so that idle machines stay visible
//! to the scheduler.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StateError, StateResult};
use crate::types::{AgentState, Job, JobId, MachineId, MachineState};

/// Store-facing wire form of a cluster snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClusterSnapshot {
    #[serde(default)]
    pub machines: Vec<MachineState>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    /// Job name → machine currently running it.
    #[serde(default)]
    pub assignments: HashMap<JobId, MachineId>,
}

impl ClusterSnapshot {
    pub fn from_json(json: &str) -> StateResult<Self> {
        serde_json::from_str(json).map_err(|e| StateError::Deserialize(e.to_string()))
    }

    pub fn to_json(&self) -> StateResult<String> {
        serde_json::to_string(self).map_err(|e| StateError::Serialize(e.to_string()))
    }
}

/// In-memory snapshot used for scheduling decisions.
///
/// Mutation requires `&mut self`, so a snapshot borrowed by an in-flight
/// decision cannot change underneath it. Share across threads behind an
/// `Arc` once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterState {
    machines: HashMap<MachineId, MachineState>,
    jobs: HashMap<JobId, Job>,
    agents: HashMap<MachineId, AgentState>,
}

impl ClusterState {
    /// Build a snapshot from the known jobs and machines.
    ///
    /// Every machine gets an empty [`AgentState`]. Input order does not
    /// matter.
    pub fn new(
        jobs: impl IntoIterator<Item = Job>,
        machines: impl IntoIterator<Item = MachineState>,
    ) -> StateResult<Self> {
        let mut state = Self::default();
        for machine in machines {
            state.add_machine(machine)?;
        }
        for job in jobs {
            state.add_job(job)?;
        }
        Ok(state)
    }

    /// Build a snapshot from agents the caller already aggregated.
    ///
    /// Machines without an agent get an empty one. The agents are taken
    /// as given: a job listed on two agents is only reported by
    /// [`check_consistency`](Self::check_consistency).
    pub fn from_parts(
        jobs: impl IntoIterator<Item = Job>,
        machines: impl IntoIterator<Item = MachineState>,
        agents: impl IntoIterator<Item = AgentState>,
    ) -> StateResult<Self> {
        let mut state = Self::new(jobs, machines)?;
        let mut seen = HashSet::new();

        for mut agent in agents {
            let id = agent.machine.id.clone();
            let Some(machine) = state.machines.get(&id) else {
                return Err(StateError::UnknownMachine(id));
            };
            if !seen.insert(id.clone()) {
                return Err(StateError::Duplicate { kind: "agent", id });
            }
            agent.machine = machine.clone();
            state.agents.insert(id, agent);
        }

        Ok(state)
    }

    /// Build a snapshot from its store wire form.
    pub fn from_snapshot(snapshot: ClusterSnapshot) -> StateResult<Self> {
        let ClusterSnapshot {
            machines,
            jobs,
            assignments,
        } = snapshot;

        let mut state = Self::new(jobs, machines)?;
        for (job, machine_id) in &assignments {
            state.schedule_job(job, machine_id)?;
        }
        Ok(state)
    }

    /// Export the snapshot in its wire form, with machines and jobs
    /// sorted by id.
    ///
    /// A job listed on several agents is exported against the lowest
    /// machine id, matching [`job_target`](Self::job_target).
    pub fn to_snapshot(&self) -> ClusterSnapshot {
        let mut machines: Vec<MachineState> = self.machines.values().cloned().collect();
        machines.sort_by(|a, b| a.id.cmp(&b.id));

        let mut jobs: Vec<Job> = self.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.name.cmp(&b.name));

        let mut assignments: HashMap<JobId, MachineId> = HashMap::new();
        for agent in self.agents.values() {
            for job in agent.jobs.keys() {
                assignments
                    .entry(job.clone())
                    .and_modify(|held| {
                        if agent.machine.id < *held {
                            held.clone_from(&agent.machine.id);
                        }
                    })
                    .or_insert_with(|| agent.machine.id.clone());
            }
        }

        ClusterSnapshot {
            machines,
            jobs,
            assignments,
        }
    }

    // ── Incremental updates ────────────────────────────────────────

    /// Register a machine with an empty agent.
    pub fn add_machine(&mut self, machine: MachineState) -> StateResult<()> {
        if machine.id.is_empty() {
            return Err(StateError::InvalidMachine("machine id is empty".to_string()));
        }
        if self.machines.contains_key(&machine.id) {
            return Err(StateError::Duplicate {
                kind: "machine",
                id: machine.id,
            });
        }

        debug!(machine = %machine.id, "machine added to snapshot");
        self.agents.insert(machine.id.clone(), AgentState::new(machine.clone()));
        self.machines.insert(machine.id.clone(), machine);
        Ok(())
    }

    /// Drop a machine and its agent.
    ///
    /// Returns the jobs that were scheduled on it, sorted by name. They
    /// remain known and become unscheduled.
    pub fn remove_machine(&mut self, machine_id: &str) -> StateResult<Vec<Job>> {
        if self.machines.remove(machine_id).is_none() {
            return Err(StateError::UnknownMachine(machine_id.to_string()));
        }

        let mut orphaned: Vec<Job> = self
            .agents
            .remove(machine_id)
            .map(|agent| agent.jobs.into_values().collect())
            .unwrap_or_default();
        orphaned.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            machine = %machine_id,
            orphaned = orphaned.len(),
            "machine removed from snapshot"
        );
        Ok(orphaned)
    }

    pub fn add_job(&mut self, job: Job) -> StateResult<()> {
        if job.name.is_empty() {
            return Err(StateError::InvalidJob("job name is empty".to_string()));
        }
        if self.jobs.contains_key(&job.name) {
            return Err(StateError::Duplicate {
                kind: "job",
                id: job.name,
            });
        }

        debug!(job = %job.name, "job added to snapshot");
        self.jobs.insert(job.name.clone(), job);
        Ok(())
    }

    /// Forget a job, unscheduling it from whichever agent holds it.
    pub fn remove_job(&mut self, name: &str) -> StateResult<Job> {
        let job = self
            .jobs
            .remove(name)
            .ok_or_else(|| StateError::UnknownJob(name.to_string()))?;

        for agent in self.agents.values_mut() {
            agent.unschedule(name);
        }

        debug!(job = %name, "job removed from snapshot");
        Ok(job)
    }

    /// Record `job` as running on `machine_id`.
    ///
    /// The job is moved off any other agent first, so it is never held
    /// by two agents at once.
    pub fn schedule_job(&mut self, job: &str, machine_id: &str) -> StateResult<()> {
        let record = self
            .jobs
            .get(job)
            .cloned()
            .ok_or_else(|| StateError::UnknownJob(job.to_string()))?;
        if !self.agents.contains_key(machine_id) {
            return Err(StateError::UnknownMachine(machine_id.to_string()));
        }

        for (id, agent) in self.agents.iter_mut() {
            if id != machine_id {
                agent.unschedule(job);
            }
        }
        if let Some(agent) = self.agents.get_mut(machine_id) {
            agent.schedule(record);
        }

        debug!(%job, machine = %machine_id, "job scheduled");
        Ok(())
    }

    /// Remove `job` from its agent. Returns the machine it was on, if any.
    pub fn unschedule_job(&mut self, job: &str) -> StateResult<Option<MachineId>> {
        if !self.jobs.contains_key(job) {
            return Err(StateError::UnknownJob(job.to_string()));
        }

        let mut previous: Option<MachineId> = None;
        for (id, agent) in self.agents.iter_mut() {
            if agent.unschedule(job).is_some() {
                previous = match previous {
                    Some(p) if p <= *id => Some(p),
                    _ => Some(id.clone()),
                };
            }
        }

        if let Some(machine) = &previous {
            debug!(%job, %machine, "job unscheduled");
        }
        Ok(previous)
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn machines(&self) -> impl Iterator<Item = &MachineState> {
        self.machines.values()
    }

    pub fn machine(&self, id: &str) -> Option<&MachineState> {
        self.machines.get(id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.get(name)
    }

    pub fn agent(&self, machine_id: &str) -> Option<&AgentState> {
        self.agents.get(machine_id)
    }

    /// All agents, in no particular order. Rank before choosing.
    pub fn agents(&self) -> impl Iterator<Item = &AgentState> {
        self.agents.values()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// True when no machine is known.
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Machine currently holding `job`.
    ///
    /// If an inconsistent snapshot lists the job on several agents the
    /// lowest machine id is returned.
    pub fn job_target(&self, job: &str) -> Option<&str> {
        self.agents
            .values()
            .filter(|agent| agent.has_job(job))
            .map(AgentState::machine_id)
            .min()
    }

    /// Known jobs not held by any agent, sorted by name.
    pub fn unscheduled_jobs(&self) -> Vec<&Job> {
        let mut pending: Vec<&Job> = self
            .jobs
            .values()
            .filter(|job| !self.agents.values().any(|agent| agent.has_job(&job.name)))
            .collect();
        pending.sort_by(|a, b| a.name.cmp(&b.name));
        pending
    }

    /// Verify the cross-agent invariants.
    ///
    /// Every job held by an agent must be a known job, and no job may be
    /// held by two agents. Violations are reported, never repaired; the
    /// lowest offending job name is reported first.
    pub fn check_consistency(&self) -> StateResult<()> {
        let mut unknown: Vec<&str> = self
            .agents
            .values()
            .flat_map(|agent| agent.jobs.keys())
            .map(String::as_str)
            .filter(|name| !self.jobs.contains_key(*name))
            .collect();
        unknown.sort_unstable();
        if let Some(name) = unknown.first() {
            return Err(StateError::UnknownJob(name.to_string()));
        }

        self.check_assignments()
    }

    /// Verify that no job is held by two agents.
    ///
    /// Reports the lowest offending job name, with its machines sorted.
    pub fn check_assignments(&self) -> StateResult<()> {
        let mut holders: HashMap<&str, Vec<&str>> = HashMap::new();
        for agent in self.agents.values() {
            for name in agent.jobs.keys() {
                holders
                    .entry(name.as_str())
                    .or_default()
                    .push(agent.machine_id());
            }
        }

        let mut duplicated: Vec<(&str, Vec<&str>)> = holders
            .into_iter()
            .filter(|(_, machines)| machines.len() > 1)
            .collect();
        duplicated.sort_unstable_by(|a, b| a.0.cmp(b.0));
        if let Some((job, mut machines)) = duplicated.into_iter().next() {
            machines.sort_unstable();
            return Err(StateError::DuplicateAssignment {
                job: job.to_string(),
                machines: machines.into_iter().map(str::to_string).collect(),
            });
        }

        Ok(())
    }
}
