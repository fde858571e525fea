//! Mixed residual and Jacobian assembly.
//!
//! Rows 0..6 are the Voigt components, row 6 the thermal degree of freedom
//! of thermomechanical blocks. Stress-like rows compare the response with
//! its target; strain-like rows compare the trial increment with its target,
//! scaled by the penalty constant.

use mp_core::{INSTANT, Mat6, Real, Vec6};
use mp_path::{BlockKind, BoundaryControl, IncrementTable, ThermalControl};
use mp_phase::StateVariables;
use nalgebra::{DMatrix, DVector};

/// Target deltas of one sub-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubstepTarget {
    pub mechanical: Vec6,
    /// Temperature delta, prescribed flux, or unused under convection.
    pub thermal: Real,
}

impl SubstepTarget {
    /// Scale row `inc` of the table by the sub-step fraction and subtract a
    /// residual carried over from a forced acceptance.
    pub fn from_table(
        table: &IncrementTable,
        inc: usize,
        dtinc: Real,
        control: &BoundaryControl,
        carry: Option<&DVector<Real>>,
    ) -> Self {
        let mut mechanical = table.mechanical[inc] * dtinc;
        let mut thermal = match control.thermal {
            ThermalControl::Flux => table.thermal[inc],
            _ => table.thermal[inc] * dtinc,
        };
        if let Some(carry) = carry {
            for k in 0..6 {
                if control.is_stress(k) {
                    mechanical[k] -= carry[k];
                }
            }
            if control.thermal == ThermalControl::Flux && carry.len() > 6 {
                thermal -= carry[6];
            }
        }
        Self {
            mechanical,
            thermal,
        }
    }
}

/// The mixed system of one step.
#[derive(Debug, Clone, Copy)]
pub struct MixedSystem {
    pub kind: BlockKind,
    pub control: BoundaryControl,
    pub penalty: Real,
    /// Convection coefficient and reference temperature.
    pub convection: Option<(Real, Real)>,
}

impl MixedSystem {
    pub fn size(&self) -> usize {
        match self.kind {
            BlockKind::Mechanical => 6,
            BlockKind::Thermomechanical => 7,
        }
    }

    pub fn residual(&self, sv: &StateVariables, target: &SubstepTarget) -> DVector<Real> {
        let mut r = DVector::zeros(self.size());
        for k in 0..6 {
            r[k] = if self.control.is_stress(k) {
                sv.sigma[k] - sv.sigma_start[k] - target.mechanical[k]
            } else {
                self.penalty * (sv.detot[k] - target.mechanical[k])
            };
        }
        if self.kind == BlockKind::Thermomechanical {
            let flux = sv.flux().unwrap_or(0.0);
            r[6] = match self.control.thermal {
                ThermalControl::Flux => flux - target.thermal,
                ThermalControl::Convection => {
                    let (h, reference) = self.convection.unwrap_or((0.0, 0.0));
                    flux + h * (sv.current_temperature() - reference)
                }
                ThermalControl::Temperature | ThermalControl::Free => {
                    self.penalty * (sv.dtemperature - target.thermal)
                }
            };
        }
        r
    }

    /// Operator of the mechanical rows for a given tangent.
    pub fn mechanical_operator(&self, tangent: &Mat6) -> DMatrix<Real> {
        let n = self.size();
        let mut k = DMatrix::zeros(n, n);
        for i in 0..6 {
            if self.control.is_stress(i) {
                for j in 0..6 {
                    k[(i, j)] = tangent[(i, j)];
                }
            } else {
                k[(i, i)] = self.penalty;
            }
        }
        k
    }

    /// Jacobian from the tangents in `sv`. `dtime` is the time increment of
    /// the evaluation that produced them; instantaneous tangents carry no
    /// flux/temperature stiffness and get the penalty instead.
    pub fn jacobian(&self, sv: &StateVariables, dtime: Real) -> DMatrix<Real> {
        let mut k = self.mechanical_operator(sv.stiffness());
        let Some(t) = sv.thermal() else {
            return k;
        };
        if self.kind != BlockKind::Thermomechanical {
            return k;
        }
        for i in 0..6 {
            if self.control.is_stress(i) {
                k[(i, 6)] = t.dsdt[i];
            }
        }
        match self.control.thermal {
            ThermalControl::Temperature | ThermalControl::Free => k[(6, 6)] = self.penalty,
            ThermalControl::Flux | ThermalControl::Convection => {
                for j in 0..6 {
                    k[(6, j)] = t.dflux_de[j];
                }
                k[(6, 6)] = if dtime < INSTANT {
                    self.penalty
                } else {
                    let h = self.convection.map(|(h, _)| h).unwrap_or(0.0);
                    t.dflux_dt + h
                };
            }
        }
        k
    }

    /// Change of internal stress on the stress-controlled rows, used by the
    /// fixed-operator strategy.
    pub fn internal_stress_correction(&self, sv: &StateVariables) -> DVector<Real> {
        let mut c = DVector::zeros(self.size());
        for k in 0..6 {
            if self.control.is_stress(k) {
                c[k] = sv.sigma_in[k] - sv.sigma_in_start[k];
            }
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_path::MechControl;
    use mp_phase::{KindTag, StateKind};

    fn tension_control() -> BoundaryControl {
        let mut c = BoundaryControl::default();
        for k in 1..6 {
            c.mechanical[k] = MechControl::Stress;
        }
        c
    }

    fn system(kind: BlockKind, control: BoundaryControl) -> MixedSystem {
        MixedSystem {
            kind,
            control,
            penalty: 100.0,
            convection: None,
        }
    }

    #[test]
    fn mixed_rows() {
        let sys = system(BlockKind::Mechanical, tension_control());
        let mut sv = StateVariables::new(KindTag::Mechanical, 0, 0.0);
        sv.detot[0] = 0.5;
        sv.sigma[1] = 3.0;
        sv.sigma_start[1] = 1.0;
        let target = SubstepTarget {
            mechanical: Vec6::new(1.0, 0.5, 0.0, 0.0, 0.0, 0.0),
            thermal: 0.0,
        };
        let r = sys.residual(&sv, &target);
        assert_eq!(r.len(), 6);
        assert_eq!(r[0], -50.0);
        assert_eq!(r[1], 1.5);
    }

    #[test]
    fn jacobian_uses_tangent_rows_and_penalty_diagonal() {
        let sys = system(BlockKind::Mechanical, tension_control());
        let mut sv = StateVariables::new(KindTag::Mechanical, 0, 0.0);
        if let StateKind::Mechanical(m) = &mut sv.kind {
            m.lt = Mat6::from_fn(|i, j| (i * 6 + j + 1) as Real);
        }
        let k = sys.jacobian(&sv, 1.0);
        assert_eq!(k[(0, 0)], 100.0);
        assert_eq!(k[(0, 1)], 0.0);
        assert_eq!(k[(1, 0)], 7.0);
        assert_eq!(k[(5, 5)], 36.0);
    }

    #[test]
    fn convective_row_adds_coefficient() {
        let mut control = BoundaryControl::default();
        control.thermal = ThermalControl::Convection;
        let sys = MixedSystem {
            convection: Some((3.0, 290.0)),
            ..system(BlockKind::Thermomechanical, control)
        };
        let mut sv = StateVariables::new(KindTag::Thermomechanical, 0, 300.0);
        sv.dtemperature = -2.0;
        if let Some(t) = sv.thermal_mut() {
            t.flux = -1.0;
            t.dflux_dt = 5.0;
        }
        let r = sys.residual(&sv, &SubstepTarget {
            mechanical: Vec6::zeros(),
            thermal: 0.0,
        });
        assert_eq!(r[6], -1.0 + 3.0 * 8.0);
        assert_eq!(sys.jacobian(&sv, 1.0)[(6, 6)], 8.0);
        // Instantaneous trials have no thermal stiffness of their own.
        assert_eq!(sys.jacobian(&sv, 0.0)[(6, 6)], 100.0);
    }

    #[test]
    fn carry_only_corrects_stress_and_flux_targets() {
        let mut control = tension_control();
        control.thermal = ThermalControl::Flux;
        let table = IncrementTable {
            times: vec![1.0],
            mechanical: vec![Vec6::from_element(2.0)],
            thermal: vec![4.0],
        };
        let carry = DVector::from_element(7, 1.0);
        let t = SubstepTarget::from_table(&table, 0, 0.5, &control, Some(&carry));
        assert_eq!(t.mechanical[0], 1.0);
        assert_eq!(t.mechanical[1], 0.0);
        assert_eq!(t.thermal, 3.0);
    }
}
