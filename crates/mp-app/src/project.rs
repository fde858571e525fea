//! Simulation project file.

use mp_path::{LoadingPathDef, OutputSpec};
use mp_phase::MaterialProps;
use mp_solver::SolverConfig;
use serde::{Deserialize, Serialize};

/// One material point simulation: a material, a loading path, and how to
/// solve and report it.
///
/// ```yaml
/// name: bar
/// material: { law: ELISO, props: [70000.0, 0.3, 0.0] }
/// path:
///   initial_temperature: 293.15
///   blocks: [...]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub material: MaterialProps,
    #[serde(default)]
    pub solver: SolverConfig,
    pub path: LoadingPathDef,
    #[serde(default)]
    pub output: OutputSpec,
}
