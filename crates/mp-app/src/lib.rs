//! Shared application service layer for matpath.
//!
//! Loads and validates simulation projects, wires the loading path, the RVE,
//! the constitutive evaluator and the result store together, and runs the
//! equilibrium solver. The CLI is a thin shell over this crate.

pub mod error;
pub mod project;
pub mod project_service;
pub mod run_service;

pub use error::{AppError, AppResult};
pub use project::Project;
pub use project_service::{
    PreparedProject, load_project, prepare_project, save_project, show_path, validate_project,
};
pub use run_service::{RunOptions, RunRequest, RunResponse, ensure_run, list_runs, load_run};
