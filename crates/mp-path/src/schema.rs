//! YAML schema of a loading path and its conversion into [`LoadingPath`].

use std::path::{Path, PathBuf};

use mp_core::{Real, Vec6, ensure_finite};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::block::{Block, BlockKind, LoadingPath};
use crate::control::{BoundaryControl, MechControl, ThermalControl};
use crate::error::{PathError, PathResult, StepId};
use crate::step::{LoadingMode, Step};
use crate::substep::SubstepControl;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadingPathDef {
    pub initial_temperature: Real,
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockDef {
    pub kind: BlockKind,
    #[serde(default = "one")]
    pub cycles: usize,
    #[serde(default)]
    pub steps: Vec<StepDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDef {
    /// `monotonic`, `cyclic_cosine` or `incremental`.
    pub mode: String,
    /// Increment file of an incremental step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default)]
    pub duration: Real,
    #[serde(default = "one")]
    pub increments: usize,
    #[serde(default)]
    pub substep: SubstepControl,
    /// Six entries in Voigt order 11, 22, 33, 12, 13, 23.
    pub mechanical: Vec<ComponentDef>,
    #[serde(default)]
    pub thermal: ThermalDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub control: CodeDef<MechControl>,
    #[serde(default)]
    pub target: Real,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThermalDef {
    pub control: CodeDef<ThermalControl>,
    /// Temperature, flux, or convection coefficient depending on `control`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Real>,
    /// Reference temperature of convective exchange; defaults to the
    /// initial temperature of the path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Real>,
}

impl Default for ThermalDef {
    fn default() -> Self {
        Self {
            control: CodeDef::Named(ThermalControl::Temperature),
            target: None,
            reference: None,
        }
    }
}

/// A control code given by name or by its legacy number.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CodeDef<T> {
    Named(T),
    Legacy(i32),
}

impl<T: TryFrom<i32, Error = i32> + Copy> CodeDef<T> {
    fn resolve(&self, step: StepId, what: &'static str) -> PathResult<T> {
        match *self {
            CodeDef::Named(c) => Ok(c),
            CodeDef::Legacy(n) => T::try_from(n).map_err(|code| PathError::UnknownControlCode {
                step,
                what,
                code: code.into(),
            }),
        }
    }
}

fn one() -> usize {
    1
}

/// Read a loading path from YAML. Relative increment-file paths are taken
/// relative to the directory holding `path`.
pub fn load_yaml(path: &Path) -> PathResult<LoadingPath> {
    let content = std::fs::read_to_string(path)?;
    let def: LoadingPathDef = serde_yaml::from_str(&content)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    def.build(base)
}

impl LoadingPathDef {
    /// Validate and convert into the runtime loading path.
    pub fn build(&self, base_dir: &Path) -> PathResult<LoadingPath> {
        ensure_finite(self.initial_temperature, "initial temperature").map_err(|e| {
            PathError::InvalidPath {
                what: e.to_string(),
            }
        })?;
        if self.blocks.is_empty() {
            return Err(PathError::InvalidPath {
                what: "no loading blocks".to_string(),
            });
        }

        let mut blocks = Vec::with_capacity(self.blocks.len());
        for (b, block_def) in self.blocks.iter().enumerate() {
            let number = b + 1;
            if block_def.cycles == 0 {
                return Err(PathError::InvalidPath {
                    what: format!("block {number} has zero cycles"),
                });
            }
            if block_def.steps.is_empty() {
                return Err(PathError::InvalidPath {
                    what: format!("block {number} has no steps"),
                });
            }
            let mut steps = Vec::with_capacity(block_def.steps.len());
            for (s, step_def) in block_def.steps.iter().enumerate() {
                let id = StepId {
                    block: number,
                    step: s + 1,
                };
                steps.push(step_def.to_step(
                    id,
                    block_def.kind,
                    self.initial_temperature,
                    base_dir,
                )?);
            }
            blocks.push(Block {
                number,
                kind: block_def.kind,
                cycles: block_def.cycles,
                steps,
            });
        }

        let path = LoadingPath {
            initial_temperature: self.initial_temperature,
            blocks,
        };
        info!(
            blocks = path.blocks.len(),
            steps = path.total_steps(),
            "loading path read"
        );
        Ok(path)
    }
}

impl StepDef {
    fn to_step(
        &self,
        id: StepId,
        kind: BlockKind,
        initial_temperature: Real,
        base_dir: &Path,
    ) -> PathResult<Step> {
        let invalid = |what: String| PathError::InvalidStep { step: id, what };

        let mode = match self.mode.as_str() {
            "monotonic" => LoadingMode::Monotonic,
            "cyclic_cosine" | "cyclic" => LoadingMode::CyclicCosine,
            "incremental" | "file" => {
                let file = self
                    .file
                    .as_ref()
                    .ok_or_else(|| invalid("incremental step without a file".to_string()))?;
                let file = if file.is_relative() {
                    base_dir.join(file)
                } else {
                    file.clone()
                };
                LoadingMode::Incremental { file }
            }
            other => {
                return Err(PathError::UnknownMode {
                    step: id,
                    mode: other.to_string(),
                });
            }
        };

        if self.mechanical.len() != 6 {
            return Err(invalid(format!(
                "expected 6 mechanical components, found {}",
                self.mechanical.len()
            )));
        }
        let mut control = BoundaryControl::default();
        let mut targets = Vec6::zeros();
        for (k, c) in self.mechanical.iter().enumerate() {
            control.mechanical[k] = c.control.resolve(id, "mechanical")?;
            targets[k] = c.target;
        }
        control.thermal = self.thermal.control.resolve(id, "thermal")?;

        let file_mode = matches!(mode, LoadingMode::Incremental { .. });
        if control.has_free() && !file_mode {
            return Err(invalid(
                "free control codes are only supported in incremental steps".to_string(),
            ));
        }
        if kind == BlockKind::Mechanical
            && matches!(
                control.thermal,
                ThermalControl::Flux | ThermalControl::Convection
            )
        {
            return Err(invalid(format!(
                "{} control requires a thermomechanical block",
                control.thermal
            )));
        }
        if control.thermal == ThermalControl::Convection {
            match self.thermal.target {
                Some(h) if h >= 0.0 => {}
                _ => {
                    return Err(invalid(
                        "convection needs a non-negative coefficient as target".to_string(),
                    ));
                }
            }
        }
        if !file_mode {
            if self.increments == 0 {
                return Err(invalid("increments must be at least 1".to_string()));
            }
            if !(self.duration >= 0.0) {
                return Err(invalid(format!("duration {} is negative", self.duration)));
            }
        }
        self.substep.validate().map_err(invalid)?;
        for v in targets.iter().chain(self.thermal.target.iter()) {
            if !v.is_finite() {
                return Err(invalid("non-finite target".to_string()));
            }
        }

        let mut step = Step::new(id, mode, control);
        step.targets = targets;
        step.thermal_target = self.thermal.target;
        step.reference_temperature = self.thermal.reference.unwrap_or(initial_temperature);
        step.duration = self.duration;
        step.increments = self.increments;
        step.substep = self.substep;
        Ok(step)
    }
}
