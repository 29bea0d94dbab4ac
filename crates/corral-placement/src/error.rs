//! Placement error types.

use corral_state::StateError;
use thiserror::Error;

/// Errors that prevent a placement decision.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("no machines available to schedule job {job}")]
    NoMachinesAvailable { job: String },

    #[error("inconsistent cluster state: {0}")]
    InconsistentState(#[from] StateError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type PlacementResult<T> = Result<T, PlacementError>;
