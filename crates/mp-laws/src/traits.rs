//! Evaluator and material-law traits.

use mp_core::Real;
use mp_phase::{KindTag, RveTree, StateVariables};

use crate::error::{LawError, LawResult};

/// Timing context of one evaluator call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalCall {
    /// Time at the last checkpoint.
    pub time: Real,
    /// Time increment of the trial.
    pub dtime: Real,
    /// Set on the first call of a block, where only tangents are expected.
    pub first: bool,
}

impl EvalCall {
    pub fn new(time: Real, dtime: Real) -> Self {
        Self {
            time,
            dtime,
            first: false,
        }
    }

    pub fn first(time: Real) -> Self {
        Self {
            time,
            dtime: 0.0,
            first: true,
        }
    }
}

/// Outcome of an evaluator call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvalStatus {
    Converged,
    /// The trial is too large; retry with the sub-step scaled by the factor.
    Reduce(Real),
}

/// Updates the whole RVE from the trial increments stored in its root
/// global state.
///
/// Implementations read `etot`, `detot`, `temperature`, `dtemperature` and
/// the checkpointed internal state, and write stress, tangents, internal
/// state and (thermomechanical) flux with its partials. Ordinary
/// non-convergence is reported as [`EvalStatus::Reduce`]; errors are fatal.
pub trait ConstitutiveEvaluator {
    fn name(&self) -> &str;

    fn mechanical(&mut self, rve: &mut RveTree, call: &EvalCall) -> LawResult<EvalStatus>;

    fn thermomechanical(&mut self, _rve: &mut RveTree, _call: &EvalCall) -> LawResult<EvalStatus> {
        Err(LawError::NotSupported {
            what: "thermomechanical evaluation",
        })
    }

    /// Dispatch on the state kind carried by the RVE.
    fn evaluate(&mut self, rve: &mut RveTree, call: &EvalCall) -> LawResult<EvalStatus> {
        match rve.kind() {
            KindTag::Mechanical => self.mechanical(rve, call),
            KindTag::Thermomechanical => self.thermomechanical(rve, call),
        }
    }
}

/// A constitutive law at a single material point, working in the material
/// frame.
pub trait MaterialLaw {
    fn name(&self) -> &str;

    fn mechanical(&self, sv: &mut StateVariables, call: &EvalCall) -> LawResult<EvalStatus>;

    fn thermomechanical(&self, _sv: &mut StateVariables, _call: &EvalCall) -> LawResult<EvalStatus> {
        Err(LawError::NotSupported {
            what: "thermomechanical update",
        })
    }
}
