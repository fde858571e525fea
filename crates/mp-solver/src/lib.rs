//! mp-solver: mixed stress/strain equilibrium solver.
//!
//! Drives a [`ConstitutiveEvaluator`](mp_laws::ConstitutiveEvaluator)
//! through a [`LoadingPath`](mp_path::LoadingPath), nesting
//! block → cycle → step → increment → sub-step → Newton iteration.

pub mod config;
pub mod error;
pub mod mixed;
pub mod output;
pub mod run;
pub mod solver;

pub use config::{SolverConfig, Strategy};
pub use error::{FailureReason, Location, RunFailure, SolverError, SolverResult};
pub use mixed::{MixedSystem, SubstepTarget};
pub use output::{Frame, MemorySink, NullSink, OutputRecord, OutputSink, collect_records};
pub use run::{RunState, RunSummary};
pub use solver::{EquilibriumSolver, kind_tag};
