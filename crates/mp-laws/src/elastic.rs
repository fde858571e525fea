//! Linear (thermo)elasticity.

use mp_core::{INSTANT, Mat6, Real, Vec6, ensure_all_finite};
use mp_phase::{StateKind, StateVariables};

use crate::error::{LawError, LawResult};
use crate::traits::{EvalCall, EvalStatus, MaterialLaw};

/// Linear thermoelastic material point.
///
/// `σ = σ_start + L·(Δε − α·ΔT)`. In thermomechanical updates the heat
/// supply rate is `r = (ρc·ΔT + T·(L·α)·Δε) / Δt`, zero for instantaneous
/// trials.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearElastic {
    name: &'static str,
    stiffness: Mat6,
    /// Expansion coefficients in Voigt form (engineering shear).
    alpha: Vec6,
    /// Volumetric heat capacity.
    rho_cp: Real,
}

fn isotropic_stiffness(e: Real, nu: Real) -> Mat6 {
    let lambda = e * nu / ((1.0 + nu) * (1.0 - 2.0 * nu));
    let mu = e / (2.0 * (1.0 + nu));
    let mut l = Mat6::zeros();
    for i in 0..3 {
        for j in 0..3 {
            l[(i, j)] = lambda;
        }
        l[(i, i)] += 2.0 * mu;
        l[(i + 3, i + 3)] = mu;
    }
    l
}

impl LinearElastic {
    /// `ELISO`: `[E, nu, alpha]`, optionally followed by `rho_cp`.
    pub fn isotropic(props: &[Real]) -> LawResult<Self> {
        if !(3..=4).contains(&props.len()) {
            return Err(LawError::PropCount {
                law: "ELISO",
                expected: "3 or 4",
                found: props.len(),
            });
        }
        ensure_all_finite(props, "ELISO props")?;
        let (e, nu, alpha) = (props[0], props[1], props[2]);
        if !(e > 0.0) {
            return Err(LawError::NonPhysical {
                what: format!("Young's modulus {e}"),
            });
        }
        if !(nu > -1.0 && nu < 0.5) {
            return Err(LawError::NonPhysical {
                what: format!("Poisson ratio {nu} outside (-1, 0.5)"),
            });
        }
        Ok(Self {
            name: "ELISO",
            stiffness: isotropic_stiffness(e, nu),
            alpha: Vec6::new(alpha, alpha, alpha, 0.0, 0.0, 0.0),
            rho_cp: props.get(3).copied().unwrap_or(0.0),
        })
    }

    /// `ELORT`: `[Ex, Ey, Ez, nuxy, nuxz, nuyz, Gxy, Gxz, Gyz, alphax,
    /// alphay, alphaz]`, optionally followed by `rho_cp`.
    pub fn orthotropic(props: &[Real]) -> LawResult<Self> {
        if !(12..=13).contains(&props.len()) {
            return Err(LawError::PropCount {
                law: "ELORT",
                expected: "12 or 13",
                found: props.len(),
            });
        }
        ensure_all_finite(props, "ELORT props")?;
        let [ex, ey, ez, nuxy, nuxz, nuyz, gxy, gxz, gyz] = [
            props[0], props[1], props[2], props[3], props[4], props[5], props[6], props[7],
            props[8],
        ];
        if [ex, ey, ez, gxy, gxz, gyz].iter().any(|m| !(*m > 0.0)) {
            return Err(LawError::NonPhysical {
                what: "orthotropic moduli must be positive".to_string(),
            });
        }

        let mut compliance = Mat6::zeros();
        compliance[(0, 0)] = 1.0 / ex;
        compliance[(1, 1)] = 1.0 / ey;
        compliance[(2, 2)] = 1.0 / ez;
        compliance[(0, 1)] = -nuxy / ex;
        compliance[(0, 2)] = -nuxz / ex;
        compliance[(1, 2)] = -nuyz / ey;
        compliance[(1, 0)] = compliance[(0, 1)];
        compliance[(2, 0)] = compliance[(0, 2)];
        compliance[(2, 1)] = compliance[(1, 2)];
        compliance[(3, 3)] = 1.0 / gxy;
        compliance[(4, 4)] = 1.0 / gxz;
        compliance[(5, 5)] = 1.0 / gyz;

        let stiffness = compliance.try_inverse().ok_or(LawError::Singular {
            what: "orthotropic compliance",
        })?;
        Ok(Self {
            name: "ELORT",
            stiffness,
            alpha: Vec6::new(props[9], props[10], props[11], 0.0, 0.0, 0.0),
            rho_cp: props.get(12).copied().unwrap_or(0.0),
        })
    }

    pub fn stiffness(&self) -> &Mat6 {
        &self.stiffness
    }

    fn update_stress(&self, sv: &mut StateVariables) {
        let elastic = sv.detot - self.alpha * sv.dtemperature;
        sv.sigma = sv.sigma_start + self.stiffness * elastic;
    }
}

impl MaterialLaw for LinearElastic {
    fn name(&self) -> &str {
        self.name
    }

    fn mechanical(&self, sv: &mut StateVariables, _call: &EvalCall) -> LawResult<EvalStatus> {
        self.update_stress(sv);
        match &mut sv.kind {
            StateKind::Mechanical(m) => m.lt = self.stiffness,
            StateKind::Thermomechanical(_) => {
                return Err(LawError::NotSupported {
                    what: "mechanical update of a thermomechanical state",
                });
            }
        }
        Ok(EvalStatus::Converged)
    }

    fn thermomechanical(&self, sv: &mut StateVariables, call: &EvalCall) -> LawResult<EvalStatus> {
        self.update_stress(sv);
        let coupling = self.stiffness * self.alpha;
        let temperature = sv.temperature;
        let (dtemperature, detot) = (sv.dtemperature, sv.detot);
        let Some(t) = sv.thermal_mut() else {
            return Err(LawError::NotSupported {
                what: "thermomechanical update of a mechanical state",
            });
        };
        t.dsde = self.stiffness;
        t.dsdt = -coupling;
        if call.dtime > INSTANT {
            t.flux = (self.rho_cp * dtemperature + temperature * coupling.dot(&detot)) / call.dtime;
            t.dflux_de = coupling * (temperature / call.dtime);
            t.dflux_dt = self.rho_cp / call.dtime;
        } else {
            t.flux = 0.0;
            t.dflux_de = Vec6::zeros();
            t.dflux_dt = 0.0;
        }
        Ok(EvalStatus::Converged)
    }
}
