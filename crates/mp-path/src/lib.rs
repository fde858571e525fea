//! Loading paths: blocks, steps, boundary-control codes and the step generator.
//!
//! A [`LoadingPath`] is read once from YAML ([`schema`]) and is read-only
//! afterwards, except for each [`Step`]'s increment table which
//! [`Step::generate`] rebuilds at step entry from the converged state.

pub mod block;
pub mod control;
pub mod error;
pub mod output;
pub mod schema;
pub mod step;
pub mod substep;

pub use block::{Block, BlockKind, LoadingPath};
pub use control::{BoundaryControl, MechControl, ThermalControl};
pub use error::{PathError, PathResult, StepId};
pub use output::{Cadence, OutputSpec, StatevSelection};
pub use schema::{LoadingPathDef, load_yaml};
pub use step::{CurrentState, IncrementTable, LoadingMode, Step, cosine_weights};
pub use substep::{Substep, SubstepControl};
