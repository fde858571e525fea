//! Error types for RVE construction and state handling.

use mp_core::PhaseId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhaseError {
    #[error("Unknown phase {0}")]
    UnknownPhase(PhaseId),

    #[error("Invalid geometry for phase {phase}: {what}")]
    InvalidGeometry { phase: PhaseId, what: String },

    #[error("Volume fractions of the children of phase {phase} sum to {sum}, expected 1")]
    FractionSum { phase: PhaseId, sum: f64 },

    #[error("State kind mismatch in phase {phase}: global and local twins disagree")]
    KindMismatch { phase: PhaseId },

    #[error("Invalid material properties for phase {phase}: {what}")]
    InvalidMaterial { phase: PhaseId, what: String },

    #[error("Numeric error: {0}")]
    Numeric(#[from] mp_core::MpError),
}

pub type PhaseResult<T> = Result<T, PhaseError>;
