//! Voigt notation and frame rotation.
//!
//! Symmetric second-order tensors are stored as 6-vectors ordered
//! `11, 22, 33, 12, 13, 23`. Stresses keep their tensor shear components;
//! strains use engineering shear (`2·ε12`, ...), so that `σ·ε` is the
//! work-conjugate product.

use nalgebra::{Matrix3, Matrix6, Rotation3, Vector3, Vector6};

use crate::Real;

pub type Vec6 = Vector6<Real>;
pub type Mat6 = Matrix6<Real>;

/// Tensor index pairs for each Voigt slot.
pub const VOIGT_PAIRS: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (0, 1), (0, 2), (1, 2)];

/// Display labels for the Voigt slots.
pub const VOIGT_LABELS: [&str; 6] = ["11", "22", "33", "12", "13", "23"];

/// Euler angles (z-x-z, radians) of a material frame relative to the global frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Orientation {
    #[cfg_attr(feature = "serde", serde(default))]
    pub psi: Real,
    #[cfg_attr(feature = "serde", serde(default))]
    pub theta: Real,
    #[cfg_attr(feature = "serde", serde(default))]
    pub phi: Real,
}

impl Orientation {
    pub fn new(psi: Real, theta: Real, phi: Real) -> Self {
        Self { psi, theta, phi }
    }

    pub fn is_identity(&self) -> bool {
        self.psi == 0.0 && self.theta == 0.0 && self.phi == 0.0
    }

    /// Rotation taking material-frame components to global-frame components.
    pub fn matrix(&self) -> Matrix3<Real> {
        let rz1 = Rotation3::from_axis_angle(&Vector3::z_axis(), self.psi);
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), self.theta);
        let rz2 = Rotation3::from_axis_angle(&Vector3::z_axis(), self.phi);
        (rz1 * rx * rz2).into_inner()
    }
}

/// Pair of 6x6 operators rotating stress-like and strain-like Voigt vectors
/// from the material frame to the global frame.
///
/// For a proper rotation `qe⁻¹ = qsᵀ`, which is what makes the inverse
/// transforms below exact transposes instead of matrix inversions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRotation {
    qs: Mat6,
    qe: Mat6,
}

impl FrameRotation {
    pub fn from_orientation(orientation: &Orientation) -> Self {
        Self::from_matrix(&orientation.matrix())
    }

    pub fn identity() -> Self {
        Self {
            qs: Mat6::identity(),
            qe: Mat6::identity(),
        }
    }

    pub fn from_matrix(r: &Matrix3<Real>) -> Self {
        let mut qs = Mat6::zeros();
        let mut qe = Mat6::zeros();
        for (row, &(i, j)) in VOIGT_PAIRS.iter().enumerate() {
            for (col, &(k, l)) in VOIGT_PAIRS.iter().enumerate() {
                let s = if k == l {
                    r[(i, k)] * r[(j, k)]
                } else {
                    r[(i, k)] * r[(j, l)] + r[(i, l)] * r[(j, k)]
                };
                let row_scale = if i == j { 1.0 } else { 2.0 };
                let col_scale = if k == l { 1.0 } else { 0.5 };
                qs[(row, col)] = s;
                qe[(row, col)] = row_scale * col_scale * s;
            }
        }
        Self { qs, qe }
    }

    pub fn stress_to_global(&self, v: &Vec6) -> Vec6 {
        self.qs * v
    }

    pub fn strain_to_global(&self, v: &Vec6) -> Vec6 {
        self.qe * v
    }

    pub fn stress_to_local(&self, v: &Vec6) -> Vec6 {
        self.qe.transpose() * v
    }

    pub fn strain_to_local(&self, v: &Vec6) -> Vec6 {
        self.qs.transpose() * v
    }

    /// Rotate a stress/strain tangent (`dσ/dε`) to the global frame.
    pub fn tangent_to_global(&self, m: &Mat6) -> Mat6 {
        self.qs * m * self.qs.transpose()
    }

    pub fn tangent_to_local(&self, m: &Mat6) -> Mat6 {
        self.qe.transpose() * m * self.qe
    }
}
