//! placement.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PlacementError, PlacementResult};
use crate::scheduler::{LeastLoadedScheduler, Scheduler};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlacementConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub policy: SchedulingPolicy,
    /// Reject snapshots that list a job on two machines.
    #[serde(default = "default_check_consistency")]
    pub check_consistency: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: SchedulingPolicy::default(),
            check_consistency: default_check_consistency(),
        }
    }
}

fn default_check_consistency() -> bool {
    true
}

/// Which placement policy to run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulingPolicy {
    #[default]
    LeastLoaded,
}

impl PlacementConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    pub fn from_toml_str(content: &str) -> PlacementResult<Self> {
        toml::from_str(content).map_err(|e| PlacementError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Instantiate the configured policy.
    pub fn build_scheduler(&self) -> Box<dyn Scheduler> {
        match self.scheduler.policy {
            SchedulingPolicy::LeastLoaded => Box::new(
                LeastLoadedScheduler::new()
                    .with_consistency_check(self.scheduler.check_consistency),
            ),
        }
    }
}
