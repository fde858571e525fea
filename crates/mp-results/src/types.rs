//! Result data types.

use mp_solver::{RunFailure, RunSummary};
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    /// Project name.
    pub name: String,
    pub timestamp: String,
    pub solver_version: String,
    /// Result tables written for this run, relative to the run directory.
    #[serde(default)]
    pub files: Vec<String>,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed {
        summary: RunSummary,
    },
    Failed {
        block: usize,
        cycle: usize,
        step: usize,
        increment: usize,
        message: String,
    },
    /// The run stopped before the solver loop, e.g. on an output error.
    Aborted { message: String },
}

impl RunOutcome {
    pub fn failed(failure: &RunFailure) -> Self {
        RunOutcome::Failed {
            block: failure.location.block,
            cycle: failure.location.cycle,
            step: failure.location.step,
            increment: failure.location.increment,
            message: failure.to_string(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}
