//! Error types for the mp-app service layer.

use std::path::PathBuf;

use mp_solver::RunFailure;

/// Application error type that wraps errors from the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write project file: {path}")]
    ProjectFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Loading path error: {0}")]
    Path(String),

    #[error("Material error: {0}")]
    Material(String),

    #[error("Solver error: {0}")]
    Solver(String),

    /// The solver stopped; the manifest of the partial run has been saved.
    #[error("Run {run_id} failed: {failure}")]
    RunFailed { run_id: String, failure: RunFailure },

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for mp-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<mp_path::PathError> for AppError {
    fn from(err: mp_path::PathError) -> Self {
        AppError::Path(err.to_string())
    }
}

impl From<mp_phase::PhaseError> for AppError {
    fn from(err: mp_phase::PhaseError) -> Self {
        AppError::Material(err.to_string())
    }
}

impl From<mp_laws::LawError> for AppError {
    fn from(err: mp_laws::LawError) -> Self {
        AppError::Material(err.to_string())
    }
}

impl From<mp_solver::SolverError> for AppError {
    fn from(err: mp_solver::SolverError) -> Self {
        match err {
            mp_solver::SolverError::Path(e) => AppError::Path(e.to_string()),
            other => AppError::Solver(other.to_string()),
        }
    }
}

impl From<mp_results::ResultsError> for AppError {
    fn from(err: mp_results::ResultsError) -> Self {
        match err {
            mp_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}
