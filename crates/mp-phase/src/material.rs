//! Phase geometry and material properties.

use mp_core::{Orientation, Real};
use serde::{Deserialize, Serialize};

/// Shape family of a phase, as seen by a homogenization engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryKind {
    General,
    Layer,
    Ellipsoid { axes: [Real; 3] },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub kind: GeometryKind,
    /// Volume fraction inside the parent phase.
    pub concentration: Real,
}

impl Geometry {
    pub fn general(concentration: Real) -> Self {
        Self {
            kind: GeometryKind::General,
            concentration,
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::general(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProps {
    /// Phase number used in output file names.
    #[serde(default)]
    pub number: u32,
    /// Name of the constitutive law, e.g. `ELISO`.
    pub law: String,
    /// Material frame relative to the global frame.
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub props: Vec<Real>,
    #[serde(default)]
    pub nstatev: usize,
}

impl MaterialProps {
    pub fn new(law: impl Into<String>, props: Vec<Real>) -> Self {
        Self {
            number: 0,
            law: law.into(),
            orientation: Orientation::default(),
            props,
            nstatev: 0,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_statev(mut self, nstatev: usize) -> Self {
        self.nstatev = nstatev;
        self
    }
}
