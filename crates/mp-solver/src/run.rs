//! Mutable state threaded through the solver loops.

use mp_core::{Mat6, Real};
use mp_path::Substep;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{FailureReason, Location, RunFailure};

/// Counters reported at the end of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Accepted increments.
    pub increments: usize,
    /// Accepted sub-steps.
    pub substeps: usize,
    /// Sub-steps discarded and retried smaller.
    pub retractions: usize,
    /// Out-of-tolerance states accepted at the minimal sub-step.
    pub forced_continuations: usize,
    /// Newton iterations over the whole run.
    pub iterations: usize,
    /// Output events (each covers every phase in both frames).
    pub outputs: usize,
    pub final_time: Real,
}

/// Loop state of one run.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Time at the last accepted sub-step.
    pub time: Real,
    /// Time increment of the current trial.
    pub dtime: Real,
    /// Time increment of the call that produced the current tangents.
    pub eval_dtime: Real,
    pub location: Location,
    pub substep: Substep,
    /// Residual norm of the last Newton loop.
    pub error: Real,
    pub residual: DVector<Real>,
    /// Residual of a forced acceptance, folded into the next target.
    pub carry: Option<DVector<Real>>,
    /// Newton iterations of the current sub-step.
    pub iterations: usize,
    /// Tangent captured at block start; reference of the fixed operator.
    pub reference: Mat6,
    pub output_count: usize,
    pub output_time: Real,
    pub summary: RunSummary,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            time: 0.0,
            dtime: 0.0,
            eval_dtime: 0.0,
            location: Location::default(),
            substep: Substep::default(),
            error: 0.0,
            residual: DVector::zeros(6),
            carry: None,
            iterations: 0,
            reference: Mat6::zeros(),
            output_count: 0,
            output_time: 0.0,
            summary: RunSummary::default(),
        }
    }
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure(&self, reason: FailureReason) -> RunFailure {
        RunFailure {
            location: self.location,
            fraction: self.substep.tinc,
            substep: self.substep.dtinc,
            residual: self.error,
            reason,
        }
    }

    pub fn reset_output_counters(&mut self) {
        self.output_count = 0;
        self.output_time = 0.0;
    }
}
