//! mp-results: tab-separated result files and the run store.

pub mod hash;
pub mod sink;
pub mod store;
pub mod types;

pub use hash::compute_run_id;
pub use sink::{FileSink, table_file_name};
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },

    #[error("Malformed result table {file}: {what}")]
    MalformedTable { file: String, what: String },

    #[error("Phase number {number} is used by more than one phase")]
    DuplicatePhaseNumber { number: u32 },

    #[error("No result file open for phase {phase_number} ({frame})")]
    NotOpen { phase_number: u32, frame: String },
}

impl From<ResultsError> for mp_solver::SolverError {
    fn from(err: ResultsError) -> Self {
        mp_solver::SolverError::Output {
            message: err.to_string(),
        }
    }
}
