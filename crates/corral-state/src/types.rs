//! Domain types for the cluster snapshot.
//!
//! These are plain value records describing units of work, cluster
//! members, and the observed assignment of one to the other. All types
//! are serializable to/from JSON, which is how the external store hands
//! them to the engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique name of a job, e.g. `web.service`.
pub type JobId = String;

/// Unique, stable identifier of a machine in the cluster.
pub type MachineId = String;

// ── Job ───────────────────────────────────────────────────────────

/// A named unit of work the cluster should run somewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    pub name: JobId,
    /// Unit definition body. Opaque to the placement engine.
    #[serde(default)]
    pub unit: String,
}

impl Job {
    pub fn new(name: impl Into<JobId>) -> Self {
        Self {
            name: name.into(),
            unit: String::new(),
        }
    }

    pub fn with_unit(name: impl Into<JobId>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }

    /// Unit type suffix of the job name (`service` for `web.service`).
    ///
    /// Returns `None` when the name has no suffix.
    pub fn unit_type(&self) -> Option<&str> {
        match self.name.rsplit_once('.') {
            Some((stem, suffix)) if !stem.is_empty() && !suffix.is_empty() => Some(suffix),
            _ => None,
        }
    }
}

// ── Machine ───────────────────────────────────────────────────────

/// A cluster member capable of hosting jobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MachineState {
    pub id: MachineId,
    #[serde(default)]
    pub public_ip: Option<String>,
    /// Host metadata (`region=us-east`, ...). Carried, not consulted.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Agent version reported by the machine.
    #[serde(default)]
    pub version: Option<String>,
}

impl MachineState {
    pub fn new(id: impl Into<MachineId>) -> Self {
        Self {
            id: id.into(),
            public_ip: None,
            metadata: HashMap::new(),
            version: None,
        }
    }
}

// ── Agent ─────────────────────────────────────────────────────────

/// The observed set of jobs currently scheduled to one machine.
///
/// Maintained by the reconciliation layer; the scheduler only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentState {
    pub machine: MachineState,
    #[serde(default)]
    pub jobs: HashMap<JobId, Job>,
}

impl AgentState {
    /// An agent with no scheduled work.
    pub fn new(machine: MachineState) -> Self {
        Self {
            machine,
            jobs: HashMap::new(),
        }
    }

    pub fn machine_id(&self) -> &str {
        &self.machine.id
    }

    /// Number of jobs currently scheduled here.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn has_job(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// Record a job as scheduled here, replacing any job of the same name.
    pub fn schedule(&mut self, job: Job) {
        self.jobs.insert(job.name.clone(), job);
    }

    pub fn unschedule(&mut self, name: &str) -> Option<Job> {
        self.jobs.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_type_is_name_suffix() {
        assert_eq!(Job::new("foo.service").unit_type(), Some("service"));
        assert_eq!(Job::new("a.b.socket").unit_type(), Some("socket"));
        assert_eq!(Job::new("foo").unit_type(), None);
        assert_eq!(Job::new("foo.").unit_type(), None);
        assert_eq!(Job::new(".service").unit_type(), None);
    }

    #[test]
    fn agent_schedule_and_unschedule() {
        let mut agent = AgentState::new(MachineState::new("m1"));
        assert_eq!(agent.job_count(), 0);

        agent.schedule(Job::new("a.service"));
        agent.schedule(Job::new("b.service"));
        agent.schedule(Job::with_unit("a.service", "[Service]\nExecStart=/bin/true"));

        assert_eq!(agent.job_count(), 2);
        assert!(agent.has_job("a.service"));
        assert_eq!(agent.jobs["a.service"].unit, "[Service]\nExecStart=/bin/true");

        let removed = agent.unschedule("b.service");
        assert_eq!(removed, Some(Job::new("b.service")));
        assert_eq!(agent.unschedule("b.service"), None);
        assert_eq!(agent.job_count(), 1);
    }

    #[test]
    fn machine_state_defaults_from_json() {
        let m: MachineState = serde_json::from_str(r#"{"id":"XXX"}"#).unwrap();
        assert_eq!(m, MachineState::new("XXX"));
    }

    #[test]
    fn job_roundtrips_through_json() {
        let job = Job::with_unit("web.service", "[Unit]");
        let json = serde_json::to_string(&job).unwrap();
        let back: Job = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }
}
