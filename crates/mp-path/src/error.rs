//! Loading-path errors. Every step-level failure names the offending step.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 1-based identity of a step inside the loading path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StepId {
    pub block: usize,
    pub step: usize,
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {}, step {}", self.block, self.step)
    }
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("{step}: cannot read increment file {}: {source}", path.display())]
    IncrementFile {
        step: StepId,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{step}: increment file {} has no increments", path.display())]
    EmptyIncrementFile { step: StepId, path: PathBuf },

    #[error("{step}: line {line} of the increment file is malformed: {what}")]
    MalformedLine {
        step: StepId,
        line: usize,
        what: String,
    },

    #[error("{step}: unrecognized {what} control code {code}")]
    UnknownControlCode {
        step: StepId,
        what: &'static str,
        code: i64,
    },

    #[error("{step}: unrecognized loading mode '{mode}'")]
    UnknownMode { step: StepId, mode: String },

    #[error("{step}: {what}")]
    InvalidStep { step: StepId, what: String },

    #[error("Invalid output specification: {what}")]
    InvalidOutput { what: String },

    #[error("Invalid loading path: {what}")]
    InvalidPath { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type PathResult<T> = Result<T, PathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_identity_is_in_the_message() {
        let err = PathError::InvalidStep {
            step: StepId { block: 2, step: 5 },
            what: "increments must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "block 2, step 5: increments must be positive"
        );
    }
}
