//! Content-based hashing for run IDs.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::ResultsResult;

/// SHA-256 over the JSON form of the run input and the solver version.
pub fn compute_run_id<T: Serialize>(input: &T, solver_version: &str) -> ResultsResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(input)?.as_bytes());
    hasher.update(solver_version.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
