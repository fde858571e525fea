//! Error types for constitutive laws.

use mp_core::MpError;
use mp_phase::PhaseError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LawError {
    #[error("Unknown constitutive law '{name}'")]
    UnknownLaw { name: String },

    #[error("Law {law} expects {expected} properties, found {found}")]
    PropCount {
        law: &'static str,
        expected: &'static str,
        found: usize,
    },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: String },

    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    #[error("Singular operator: {what}")]
    Singular { what: &'static str },

    #[error("Phase error: {0}")]
    Phase(#[from] PhaseError),

    #[error("Numeric error: {0}")]
    Numeric(#[from] MpError),
}

pub type LawResult<T> = Result<T, LawError>;
