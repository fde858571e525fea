//! Evaluator for single-phase RVEs.

use mp_phase::{KindTag, RveTree};
use tracing::trace;

use crate::error::{LawError, LawResult};
use crate::registry::law_from_props;
use crate::traits::{ConstitutiveEvaluator, EvalCall, EvalStatus, MaterialLaw};

/// Runs a [`MaterialLaw`] on the root phase of a leaf-only RVE.
///
/// The root global state is rotated into the material frame, updated by the
/// law and rotated back. RVEs with sub-phases need a homogenization engine
/// and are rejected.
pub struct PhaseEvaluator {
    law: Box<dyn MaterialLaw>,
}

impl PhaseEvaluator {
    pub fn new(law: Box<dyn MaterialLaw>) -> Self {
        Self { law }
    }

    /// Build the evaluator from the root material of `rve`.
    pub fn from_rve(rve: &RveTree) -> LawResult<Self> {
        if !rve.root().is_leaf() {
            return Err(LawError::NotSupported {
                what: "RVEs with sub-phases require a homogenization engine",
            });
        }
        Ok(Self::new(law_from_props(rve.root().material())?))
    }

    fn run(&self, rve: &mut RveTree, call: &EvalCall, tag: KindTag) -> LawResult<EvalStatus> {
        let root = rve.root_mut();
        if !root.is_leaf() {
            return Err(LawError::NotSupported {
                what: "RVEs with sub-phases require a homogenization engine",
            });
        }
        root.global2local()?;
        let status = match tag {
            KindTag::Mechanical => self.law.mechanical(&mut root.state.local, call)?,
            KindTag::Thermomechanical => self.law.thermomechanical(&mut root.state.local, call)?,
        };
        root.local2global()?;
        trace!(law = self.law.name(), dtime = call.dtime, "phase evaluated");
        Ok(status)
    }
}

impl ConstitutiveEvaluator for PhaseEvaluator {
    fn name(&self) -> &str {
        self.law.name()
    }

    fn mechanical(&mut self, rve: &mut RveTree, call: &EvalCall) -> LawResult<EvalStatus> {
        self.run(rve, call, KindTag::Mechanical)
    }

    fn thermomechanical(&mut self, rve: &mut RveTree, call: &EvalCall) -> LawResult<EvalStatus> {
        self.run(rve, call, KindTag::Thermomechanical)
    }
}
