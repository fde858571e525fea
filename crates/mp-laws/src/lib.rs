//! mp-laws: constitutive-law seam of the solver.
//!
//! The solver only sees [`ConstitutiveEvaluator`]. Laws acting on a single
//! material point implement [`MaterialLaw`] and are wrapped by
//! [`PhaseEvaluator`], which takes care of the material frame.
//!
//! # Example
//!
//! ```no_run
//! use mp_laws::{ConstitutiveEvaluator, EvalCall, PhaseEvaluator};
//! use mp_phase::{KindTag, MaterialProps, RveBuilder};
//!
//! let material = MaterialProps::new("ELISO", vec![70_000.0, 0.3, 0.0]);
//! let mut rve = RveBuilder::new(material).build(KindTag::Mechanical, 293.15).unwrap();
//! let mut evaluator = PhaseEvaluator::from_rve(&rve).unwrap();
//! rve.global_mut().detot[0] = 1e-3;
//! evaluator.evaluate(&mut rve, &EvalCall::new(0.0, 1.0)).unwrap();
//! ```

pub mod elastic;
pub mod error;
pub mod evaluator;
pub mod registry;
pub mod traits;

pub use elastic::LinearElastic;
pub use error::{LawError, LawResult};
pub use evaluator::PhaseEvaluator;
pub use registry::law_from_props;
pub use traits::{ConstitutiveEvaluator, EvalCall, EvalStatus, MaterialLaw};
