//! Per-phase state variables with checkpoint semantics.
//!
//! The `*_start` fields always hold the last accepted checkpoint.
//! [`StateVariables::to_start`] discards a trial, [`StateVariables::set_start`]
//! commits it.

use mp_core::{FrameRotation, Mat6, Real, Vec6};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Which payload a state carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindTag {
    Mechanical,
    Thermomechanical,
}

/// Mechanical tangent operator `dσ/dε`.
#[derive(Debug, Clone, PartialEq)]
pub struct MechanicalTangent {
    pub lt: Mat6,
}

impl Default for MechanicalTangent {
    fn default() -> Self {
        Self { lt: Mat6::zeros() }
    }
}

/// Thermomechanical tangents plus the heat flux and its partials.
///
/// `flux` is the rate of heat supplied to the material point.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalResponse {
    pub dsde: Mat6,
    pub dsdt: Vec6,
    pub flux: Real,
    pub dflux_de: Vec6,
    pub dflux_dt: Real,
}

impl Default for ThermalResponse {
    fn default() -> Self {
        Self {
            dsde: Mat6::zeros(),
            dsdt: Vec6::zeros(),
            flux: 0.0,
            dflux_de: Vec6::zeros(),
            dflux_dt: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StateKind {
    Mechanical(MechanicalTangent),
    Thermomechanical(ThermalResponse),
}

impl StateKind {
    pub fn new(tag: KindTag) -> Self {
        match tag {
            KindTag::Mechanical => StateKind::Mechanical(MechanicalTangent::default()),
            KindTag::Thermomechanical => StateKind::Thermomechanical(ThermalResponse::default()),
        }
    }

    pub fn tag(&self) -> KindTag {
        match self {
            StateKind::Mechanical(_) => KindTag::Mechanical,
            StateKind::Thermomechanical(_) => KindTag::Thermomechanical,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateVariables {
    /// Total strain at the last checkpoint.
    pub etot: Vec6,
    /// Strain increment of the current trial.
    pub detot: Vec6,
    pub sigma: Vec6,
    pub sigma_start: Vec6,
    /// Internal stress, used by the fixed-operator strategy.
    pub sigma_in: Vec6,
    pub sigma_in_start: Vec6,
    /// Temperature at the last checkpoint.
    pub temperature: Real,
    pub dtemperature: Real,
    pub statev: DVector<Real>,
    pub statev_start: DVector<Real>,
    pub kind: StateKind,
}

impl StateVariables {
    pub fn new(tag: KindTag, nstatev: usize, temperature: Real) -> Self {
        Self {
            etot: Vec6::zeros(),
            detot: Vec6::zeros(),
            sigma: Vec6::zeros(),
            sigma_start: Vec6::zeros(),
            sigma_in: Vec6::zeros(),
            sigma_in_start: Vec6::zeros(),
            temperature,
            dtemperature: 0.0,
            statev: DVector::zeros(nstatev),
            statev_start: DVector::zeros(nstatev),
            kind: StateKind::new(tag),
        }
    }

    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    pub fn nstatev(&self) -> usize {
        self.statev.len()
    }

    /// Temperature including the trial increment.
    pub fn current_temperature(&self) -> Real {
        self.temperature + self.dtemperature
    }

    /// Total strain including the trial increment.
    pub fn current_strain(&self) -> Vec6 {
        self.etot + self.detot
    }

    /// Re-tag the payload, keeping strain, stress, temperature and internal state.
    pub fn retag(&mut self, tag: KindTag) {
        if self.tag() != tag {
            self.kind = StateKind::new(tag);
        }
    }

    /// Zero every tangent and the flux, keeping the kind.
    pub fn reset_tangents(&mut self) {
        self.kind = StateKind::new(self.tag());
    }

    /// The stress/strain tangent regardless of kind.
    pub fn stiffness(&self) -> &Mat6 {
        match &self.kind {
            StateKind::Mechanical(m) => &m.lt,
            StateKind::Thermomechanical(t) => &t.dsde,
        }
    }

    pub fn thermal(&self) -> Option<&ThermalResponse> {
        match &self.kind {
            StateKind::Thermomechanical(t) => Some(t),
            StateKind::Mechanical(_) => None,
        }
    }

    pub fn thermal_mut(&mut self) -> Option<&mut ThermalResponse> {
        match &mut self.kind {
            StateKind::Thermomechanical(t) => Some(t),
            StateKind::Mechanical(_) => None,
        }
    }

    pub fn flux(&self) -> Option<Real> {
        self.thermal().map(|t| t.flux)
    }

    /// Discard the trial response and restore the checkpoint.
    ///
    /// The trial increments (`detot`, `dtemperature`) are inputs owned by the
    /// solver and are left untouched.
    pub fn to_start(&mut self) {
        self.sigma = self.sigma_start;
        self.sigma_in = self.sigma_in_start;
        self.statev.copy_from(&self.statev_start);
    }

    /// Commit the trial response as the new checkpoint.
    pub fn set_start(&mut self) {
        self.etot += self.detot;
        self.detot = Vec6::zeros();
        self.temperature += self.dtemperature;
        self.dtemperature = 0.0;
        self.sigma_start = self.sigma;
        self.sigma_in_start = self.sigma_in;
        self.statev_start.copy_from(&self.statev);
    }

    /// Overwrite `self` (global frame) from its material-frame twin.
    pub(crate) fn assign_to_global(&mut self, local: &StateVariables, rot: &FrameRotation) {
        self.assign_rotated(
            local,
            |v| rot.stress_to_global(v),
            |v| rot.strain_to_global(v),
            |m| rot.tangent_to_global(m),
        );
    }

    /// Overwrite `self` (material frame) from its global twin.
    pub(crate) fn assign_to_local(&mut self, global: &StateVariables, rot: &FrameRotation) {
        self.assign_rotated(
            global,
            |v| rot.stress_to_local(v),
            |v| rot.strain_to_local(v),
            |m| rot.tangent_to_local(m),
        );
    }

    fn assign_rotated(
        &mut self,
        src: &StateVariables,
        stress: impl Fn(&Vec6) -> Vec6,
        strain: impl Fn(&Vec6) -> Vec6,
        tangent: impl Fn(&Mat6) -> Mat6,
    ) {
        self.etot = strain(&src.etot);
        self.detot = strain(&src.detot);
        self.sigma = stress(&src.sigma);
        self.sigma_start = stress(&src.sigma_start);
        self.sigma_in = stress(&src.sigma_in);
        self.sigma_in_start = stress(&src.sigma_in_start);
        self.temperature = src.temperature;
        self.dtemperature = src.dtemperature;
        self.statev.clone_from(&src.statev);
        self.statev_start.clone_from(&src.statev_start);

        // dq/dε pairs with a strain, so it rotates like a stress.
        self.kind = match &src.kind {
            StateKind::Mechanical(m) => StateKind::Mechanical(MechanicalTangent {
                lt: tangent(&m.lt),
            }),
            StateKind::Thermomechanical(t) => StateKind::Thermomechanical(ThermalResponse {
                dsde: tangent(&t.dsde),
                dsdt: stress(&t.dsdt),
                flux: t.flux,
                dflux_de: stress(&t.dflux_de),
                dflux_dt: t.dflux_dt,
            }),
        };
    }
}

/// The global-frame and material-frame views of one phase.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePair {
    pub global: StateVariables,
    pub local: StateVariables,
}

impl StatePair {
    pub fn new(tag: KindTag, nstatev: usize, temperature: Real) -> Self {
        let state = StateVariables::new(tag, nstatev, temperature);
        Self {
            global: state.clone(),
            local: state,
        }
    }

    pub fn to_start(&mut self) {
        self.global.to_start();
        self.local.to_start();
    }

    pub fn set_start(&mut self) {
        self.global.set_start();
        self.local.set_start();
    }

    pub fn retag(&mut self, tag: KindTag) {
        self.global.retag(tag);
        self.local.retag(tag);
    }
}
