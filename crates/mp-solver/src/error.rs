//! Solver errors and the distinguished run-failure value.

use std::fmt;

use mp_core::Real;
use mp_path::PathError;
use thiserror::Error;

/// 1-based position in the block/cycle/step/increment nest. Zero means the
/// level had not been entered yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub block: usize,
    pub cycle: usize,
    pub step: usize,
    pub increment: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {}, cycle {}, step {}, increment {}",
            self.block, self.cycle, self.step, self.increment
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureReason {
    #[error("step reduction requested below the minimal sub-step fraction")]
    StepReductionBelowMinimum,

    #[error("no convergence at the minimal sub-step fraction")]
    NotConverged,

    #[error("residual exceeds 1000 times the tolerance at the minimal sub-step fraction")]
    Diverged,

    #[error("singular mixed Jacobian")]
    SingularJacobian,

    #[error("constitutive evaluator failed: {0}")]
    Evaluator(String),
}

/// Where and why a run stopped. Increments accepted before the failure
/// remain valid.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason} at {location} (fraction {fraction}, sub-step {substep}, residual {residual:e})")]
pub struct RunFailure {
    pub location: Location,
    /// Accepted fraction of the failing increment.
    pub fraction: Real,
    /// Sub-step fraction being attempted.
    pub substep: Real,
    pub residual: Real,
    pub reason: FailureReason,
}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid solver configuration: {what}")]
    Config { what: String },

    #[error("Loading path error: {0}")]
    Path(#[from] PathError),

    #[error("Output error: {message}")]
    Output { message: String },

    #[error("Run failed: {0}")]
    Failed(RunFailure),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    pub fn failure(&self) -> Option<&RunFailure> {
        match self {
            SolverError::Failed(f) => Some(f),
            _ => None,
        }
    }
}

impl From<RunFailure> for SolverError {
    fn from(f: RunFailure) -> Self {
        SolverError::Failed(f)
    }
}
