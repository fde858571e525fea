//! RVE phase tree and per-phase state variables.
//!
//! The representative volume element is an arena of [`PhaseNode`]s addressed
//! by [`PhaseId`]. Each node owns exactly one global/local [`StatePair`] and
//! an ordered list of child ids. Only the checkpoint operations and the
//! constitutive evaluator mutate state; topology is frozen by
//! [`RveBuilder::build`].

pub mod builder;
pub mod error;
pub mod material;
pub mod state;
pub mod tree;

pub use builder::RveBuilder;
pub use error::{PhaseError, PhaseResult};
pub use material::{Geometry, GeometryKind, MaterialProps};
pub use mp_core::PhaseId;
pub use state::{
    KindTag, MechanicalTangent, StateKind, StatePair, StateVariables, ThermalResponse,
};
pub use tree::{PhaseNode, RveTree};
