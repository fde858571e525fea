//! Loading steps and the per-increment target generator.

use std::f64::consts::PI;
use std::fmt;
use std::path::{Path, PathBuf};

use mp_core::{Real, VOIGT_LABELS, Vec6};
use tracing::debug;

use crate::control::{BoundaryControl, MechControl, ThermalControl};
use crate::error::{PathError, PathResult, StepId};
use crate::substep::SubstepControl;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadingMode {
    Monotonic,
    CyclicCosine,
    /// Absolute targets read line by line from a whitespace-separated file.
    Incremental { file: PathBuf },
}

impl fmt::Display for LoadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadingMode::Monotonic => f.write_str("monotonic"),
            LoadingMode::CyclicCosine => f.write_str("cyclic-cosine"),
            LoadingMode::Incremental { file } => write!(f, "incremental ({})", file.display()),
        }
    }
}

/// Converged state the increment table is generated from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentState {
    pub time: Real,
    pub stress: Vec6,
    pub strain: Vec6,
    pub temperature: Real,
}

/// Per-increment time and target deltas of one step.
///
/// `thermal` holds a temperature delta under temperature control, the
/// prescribed flux under flux control and zero under convection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncrementTable {
    pub times: Vec<Real>,
    pub mechanical: Vec<Vec6>,
    pub thermal: Vec<Real>,
}

impl IncrementTable {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// One parsed line of an increment file: time, optional thermal value and
/// the values of the controlled mechanical components in Voigt order.
#[derive(Debug, Clone, PartialEq)]
struct IncrementLine {
    time: Real,
    thermal: Option<Real>,
    mechanical: Vec<Real>,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub id: StepId,
    pub mode: LoadingMode,
    /// Codes the step was declared with; fixes the increment-file layout.
    pub declared: BoundaryControl,
    /// Codes in effect, after free components have been resolved.
    pub control: BoundaryControl,
    /// Stress or strain targets, depending on the component's code.
    pub targets: Vec6,
    /// Temperature target, prescribed flux or convection coefficient.
    /// `None` keeps the temperature (or flux) unchanged.
    pub thermal_target: Option<Real>,
    /// Reference temperature of convective exchange.
    pub reference_temperature: Real,
    pub duration: Real,
    pub increments: usize,
    pub substep: SubstepControl,
    table: IncrementTable,
    lines: Option<Vec<IncrementLine>>,
}

/// Cosine weights clustering increments near load reversals, scaled so
/// that they sum to `n`.
pub fn cosine_weights(n: usize) -> Vec<Real> {
    if n == 0 {
        return Vec::new();
    }
    let raw: Vec<Real> = (0..n)
        .map(|k| (PI + (k + 1) as Real * 2.0 * PI / (n + 1) as Real).cos() + 1.0)
        .collect();
    let sum: Real = raw.iter().sum();
    raw.into_iter().map(|w| w * n as Real / sum).collect()
}

impl Step {
    pub fn new(id: StepId, mode: LoadingMode, control: BoundaryControl) -> Self {
        Self {
            id,
            mode,
            declared: control,
            control,
            targets: Vec6::zeros(),
            thermal_target: None,
            reference_temperature: 0.0,
            duration: 0.0,
            increments: 1,
            substep: SubstepControl::default(),
            table: IncrementTable::default(),
            lines: None,
        }
    }

    pub fn table(&self) -> &IncrementTable {
        &self.table
    }

    /// Convection coefficient when the thermal row is convective.
    pub fn convection(&self) -> Option<Real> {
        match self.control.thermal {
            ThermalControl::Convection => Some(self.thermal_target.unwrap_or(0.0)),
            _ => None,
        }
    }

    /// Rebuild the increment table from the converged state.
    pub fn generate(&mut self, current: &CurrentState) -> PathResult<()> {
        self.table = match &self.mode {
            LoadingMode::Monotonic => self.weighted_table(current, &vec![1.0; self.increments]),
            LoadingMode::CyclicCosine => {
                self.weighted_table(current, &cosine_weights(self.increments))
            }
            LoadingMode::Incremental { file } => {
                if self.lines.is_none() {
                    let file = file.clone();
                    self.lines = Some(self.read_lines(&file)?);
                }
                self.file_table(current)
            }
        };
        debug!(step = %self.id, increments = self.table.len(), "generated increment table");
        Ok(())
    }

    /// Subtract a residual left by an out-of-tolerance increment from the
    /// stress and flux targets of increment `inc`.
    ///
    /// `residual` holds the six mechanical rows, optionally followed by the
    /// thermal row.
    pub fn fold_residual(&mut self, inc: usize, residual: &[Real]) {
        let Some(row) = self.table.mechanical.get_mut(inc) else {
            return;
        };
        for (k, r) in residual.iter().take(6).enumerate() {
            if self.control.is_stress(k) {
                row[k] -= r;
            }
        }
        if self.control.thermal == ThermalControl::Flux {
            if let Some(r) = residual.get(6) {
                self.table.thermal[inc] -= r;
            }
        }
    }

    fn weighted_table(&self, current: &CurrentState, weights: &[Real]) -> IncrementTable {
        let n = weights.len();
        let nr = n as Real;
        let mut full = Vec6::zeros();
        for k in 0..6 {
            let now = match self.control.mechanical[k] {
                MechControl::Stress => current.stress[k],
                MechControl::Strain => current.strain[k],
                MechControl::Free => self.targets[k],
            };
            full[k] = self.targets[k] - now;
        }
        let thermal_full = match self.control.thermal {
            ThermalControl::Temperature => {
                self.thermal_target.unwrap_or(current.temperature) - current.temperature
            }
            _ => 0.0,
        };

        let mut table = IncrementTable::default();
        for w in weights {
            table.times.push(self.duration / nr);
            table.mechanical.push(full * (w / nr));
            table.thermal.push(match self.control.thermal {
                ThermalControl::Temperature => thermal_full * w / nr,
                ThermalControl::Flux => self.thermal_target.unwrap_or(0.0),
                ThermalControl::Free | ThermalControl::Convection => 0.0,
            });
        }
        table
    }

    fn file_table(&mut self, current: &CurrentState) -> IncrementTable {
        let declared = self.declared;
        self.control = declared;
        let mut table = IncrementTable::default();
        let lines = self.lines.as_deref().unwrap_or_default();

        let mut prev_time = current.time;
        let mut prev_thermal = match declared.thermal {
            ThermalControl::Temperature => current.temperature,
            _ => 0.0,
        };
        let mut prev_mech = Vec6::zeros();
        for k in 0..6 {
            prev_mech[k] = match declared.mechanical[k] {
                MechControl::Stress => current.stress[k],
                _ => current.strain[k],
            };
        }

        for line in lines {
            table.times.push(line.time - prev_time);
            prev_time = line.time;

            let thermal = match (declared.thermal, line.thermal) {
                (ThermalControl::Temperature, Some(v)) => {
                    let d = v - prev_thermal;
                    prev_thermal = v;
                    d
                }
                (ThermalControl::Flux, Some(v)) => v,
                _ => 0.0,
            };
            table.thermal.push(thermal);

            let mut row = Vec6::zeros();
            let mut values = line.mechanical.iter();
            for k in 0..6 {
                if declared.mechanical[k] == MechControl::Free {
                    continue;
                }
                if let Some(v) = values.next() {
                    row[k] = v - prev_mech[k];
                    prev_mech[k] = *v;
                }
            }
            table.mechanical.push(row);
        }

        if declared.has_free() {
            for k in 0..6 {
                if declared.mechanical[k] == MechControl::Free {
                    self.targets[k] = 0.0;
                }
            }
            self.control.resolve_free();
        }
        self.increments = table.len();
        table
    }

    fn read_lines(&self, file: &Path) -> PathResult<Vec<IncrementLine>> {
        let content =
            std::fs::read_to_string(file).map_err(|source| PathError::IncrementFile {
                step: self.id,
                path: file.to_path_buf(),
                source,
            })?;

        let has_thermal = matches!(
            self.declared.thermal,
            ThermalControl::Temperature | ThermalControl::Flux
        );
        let controlled = self
            .declared
            .mechanical
            .iter()
            .filter(|c| **c != MechControl::Free)
            .count();
        let expected = 2 + usize::from(has_thermal) + controlled;

        let mut lines = Vec::new();
        for (number, raw) in content.lines().enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            if tokens.len() != expected {
                return Err(PathError::MalformedLine {
                    step: self.id,
                    line: number + 1,
                    what: format!("expected {expected} columns, found {}", tokens.len()),
                });
            }
            // First column is a free-form label.
            let mut values = Vec::with_capacity(expected - 1);
            for token in &tokens[1..] {
                let v: Real = token.parse().map_err(|_| PathError::MalformedLine {
                    step: self.id,
                    line: number + 1,
                    what: format!("'{token}' is not a number"),
                })?;
                values.push(v);
            }
            let (thermal, mechanical) = if has_thermal {
                (Some(values[1]), values[2..].to_vec())
            } else {
                (None, values[1..].to_vec())
            };
            lines.push(IncrementLine {
                time: values[0],
                thermal,
                mechanical,
            });
        }

        if lines.is_empty() {
            return Err(PathError::EmptyIncrementFile {
                step: self.id,
                path: file.to_path_buf(),
            });
        }
        Ok(lines)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Step {} ({}): {}, {} increment(s), duration {}",
            self.id.step, self.id, self.mode, self.increments, self.duration
        )?;
        write!(f, "   ")?;
        for k in 0..6 {
            let c = self.control.mechanical[k];
            match c {
                MechControl::Free => write!(f, " {}:free", VOIGT_LABELS[k])?,
                _ => write!(f, " {}:{}={}", VOIGT_LABELS[k], c.letter(), self.targets[k])?,
            }
        }
        match self.thermal_target {
            Some(t) => write!(f, "  thermal: {} {}", self.control.thermal, t),
            None => write!(f, "  thermal: {}", self.control.thermal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_rest() -> CurrentState {
        CurrentState {
            time: 0.0,
            stress: Vec6::zeros(),
            strain: Vec6::zeros(),
            temperature: 293.15,
        }
    }

    fn uniaxial(mode: LoadingMode, increments: usize) -> Step {
        let mut control = BoundaryControl::default();
        for k in 1..6 {
            control.mechanical[k] = MechControl::Stress;
        }
        let mut step = Step::new(StepId { block: 1, step: 1 }, mode, control);
        step.targets[0] = 0.01;
        step.duration = 10.0;
        step.increments = increments;
        step
    }

    #[test]
    fn monotonic_splits_evenly() {
        let mut step = uniaxial(LoadingMode::Monotonic, 4);
        step.generate(&at_rest()).unwrap();
        let t = step.table();
        assert_eq!(t.len(), 4);
        assert!(t.times.iter().all(|dt| *dt == 2.5));
        assert!(t.mechanical.iter().all(|row| row[0] == 0.0025));
        assert!(t.thermal.iter().all(|d| *d == 0.0));
    }

    #[test]
    fn monotonic_targets_are_measured_from_current_state() {
        let mut step = uniaxial(LoadingMode::Monotonic, 2);
        let mut now = at_rest();
        now.strain[0] = 0.004;
        now.stress[1] = 10.0;
        step.thermal_target = Some(303.15);
        step.generate(&now).unwrap();
        let t = step.table();
        assert!((t.mechanical[0][0] - 0.003).abs() < 1e-15);
        assert_eq!(t.mechanical[0][1], -5.0);
        assert!((t.thermal[1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn cyclic_cosine_deltas_sum_to_full_delta() {
        let mut step = uniaxial(LoadingMode::CyclicCosine, 7);
        step.generate(&at_rest()).unwrap();
        let total: Real = step.table().mechanical.iter().map(|r| r[0]).sum();
        assert!((total - 0.01).abs() < 1e-14);
    }

    #[test]
    fn flux_control_prescribes_flux_directly() {
        let mut step = uniaxial(LoadingMode::Monotonic, 3);
        step.control.thermal = ThermalControl::Flux;
        step.thermal_target = Some(-2.0);
        step.generate(&at_rest()).unwrap();
        assert_eq!(step.table().thermal, vec![-2.0; 3]);
    }

    #[test]
    fn fold_residual_only_touches_stress_and_flux_rows() {
        let mut step = uniaxial(LoadingMode::Monotonic, 2);
        step.control.thermal = ThermalControl::Flux;
        step.generate(&at_rest()).unwrap();
        step.fold_residual(1, &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.5]);
        let t = step.table();
        assert_eq!(t.mechanical[1][0], 0.005);
        assert_eq!(t.mechanical[1][1], -1.0);
        assert_eq!(t.thermal[1], -0.5);
        assert_eq!(t.mechanical[0][1], 0.0);
    }

    #[test]
    fn display_lists_components() {
        let step = uniaxial(LoadingMode::Monotonic, 2);
        let s = step.to_string();
        assert!(s.contains("11:E=0.01"));
        assert!(s.contains("22:S=0"));
    }
}
