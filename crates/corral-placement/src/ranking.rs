//! Candidate ranking for placement decisions.
//!
//! Orders agents by:
//! - **Load**: fewer scheduled jobs first
//! - **Machine id**: byte-wise ascending, to break ties
//!
//! No two agents for distinct machines compare equal, so the result is
//! the same whichever sort is used and whatever order the agents came in.

use std::cmp::Ordering;

use corral_state::{AgentState, ClusterState, MachineId};

/// Total order over agents, most preferred first.
pub fn compare_agents(a: &AgentState, b: &AgentState) -> Ordering {
    a.job_count()
        .cmp(&b.job_count())
        .then_with(|| a.machine_id().cmp(b.machine_id()))
}

/// Rank agents and return them sorted (best first).
pub fn rank_agents<'a>(agents: impl IntoIterator<Item = &'a AgentState>) -> Vec<&'a AgentState> {
    let mut ranked: Vec<&AgentState> = agents.into_iter().collect();
    ranked.sort_unstable_by(|a, b| compare_agents(a, b));
    ranked
}

/// Sort owned agents in place (best first).
pub fn sort_agent_states(agents: &mut [AgentState]) {
    agents.sort_unstable_by(compare_agents);
}

/// Load summary for one ranked candidate.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LoadRank {
    pub machine_id: MachineId,
    pub job_count: usize,
}

/// Ranked load summary of every machine in the snapshot.
pub fn load_ranking(state: &ClusterState) -> Vec<LoadRank> {
    rank_agents(state.agents())
        .into_iter()
        .map(|agent| LoadRank {
            machine_id: agent.machine_id().to_string(),
            job_count: agent.job_count(),
        })
        .collect()
}
