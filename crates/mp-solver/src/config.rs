//! Run configuration.

use mp_core::Real;
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

/// How the mixed Jacobian is formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Rebuild the Jacobian from the latest tangent every iteration.
    #[default]
    ConsistentTangent,
    /// Invert one reference operator per step and correct with the
    /// internal stress tracked by the evaluator. Mechanical blocks only;
    /// thermomechanical blocks fall back to the consistent tangent.
    FixedOperator,
}

/// Solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub strategy: Strategy,
    /// Newton iterations per sub-step
    pub max_iterations: usize,
    /// Below this many iterations the next sub-step is enlarged
    pub min_iterations: usize,
    /// Convergence tolerance on the 2-norm of the residual
    pub tolerance: Real,
    /// Multiplier applied to the sub-step after a failed attempt
    pub shrink_factor: Real,
    /// Multiplier applied to the sub-step after an easy convergence
    pub grow_factor: Real,
    /// Penalty constant of strain and temperature rows
    pub penalty: Real,
    /// Accept out-of-tolerance states at the minimal sub-step
    pub force_continue: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::ConsistentTangent,
            max_iterations: 100,
            min_iterations: 10,
            tolerance: 1e-6,
            shrink_factor: 0.5,
            grow_factor: 2.0,
            penalty: 10_000.0,
            force_continue: true,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> SolverResult<()> {
        let bad = |what: &str| {
            Err(SolverError::Config {
                what: what.to_string(),
            })
        };
        if self.max_iterations == 0 {
            return bad("max_iterations must be at least 1");
        }
        if !(self.tolerance > 0.0) {
            return bad("tolerance must be positive");
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor < 1.0) {
            return bad("shrink_factor must lie in (0, 1)");
        }
        if !(self.grow_factor >= 1.0) {
            return bad("grow_factor must be at least 1");
        }
        if !(self.penalty > 0.0) {
            return bad("penalty must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: SolverConfig =
            serde_yaml::from_str("strategy: fixed_operator\nforce_continue: false\n").unwrap();
        assert_eq!(config.strategy, Strategy::FixedOperator);
        assert!(!config.force_continue);
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.penalty, 10_000.0);
        config.validate().unwrap();
    }

    #[test]
    fn shrink_factor_must_shrink() {
        let config = SolverConfig {
            shrink_factor: 1.5,
            ..SolverConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SolverError::Config { .. })
        ));
    }
}
