//! Boundary-control codes.
//!
//! Codes serialize by name (`strain`, `stress`, ...). The legacy integer
//! encoding is accepted through `TryFrom<i32>`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::block::BlockKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MechControl {
    Strain,
    Stress,
    /// Only meaningful in incremental (file-driven) steps.
    Free,
}

impl TryFrom<i32> for MechControl {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MechControl::Strain),
            1 => Ok(MechControl::Stress),
            2 => Ok(MechControl::Free),
            other => Err(other),
        }
    }
}

impl MechControl {
    pub fn letter(self) -> char {
        match self {
            MechControl::Strain => 'E',
            MechControl::Stress => 'S',
            MechControl::Free => '-',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThermalControl {
    Temperature,
    Flux,
    /// Resolves to an isothermal temperature control.
    Free,
    Convection,
}

impl TryFrom<i32> for ThermalControl {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ThermalControl::Temperature),
            1 => Ok(ThermalControl::Flux),
            2 => Ok(ThermalControl::Free),
            3 => Ok(ThermalControl::Convection),
            other => Err(other),
        }
    }
}

impl fmt::Display for ThermalControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThermalControl::Temperature => "temperature",
            ThermalControl::Flux => "flux",
            ThermalControl::Free => "free",
            ThermalControl::Convection => "convection",
        };
        f.write_str(s)
    }
}

/// Control codes of one step: six mechanical components (Voigt order) and
/// one thermal degree of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryControl {
    pub mechanical: [MechControl; 6],
    pub thermal: ThermalControl,
}

impl Default for BoundaryControl {
    fn default() -> Self {
        Self {
            mechanical: [MechControl::Strain; 6],
            thermal: ThermalControl::Temperature,
        }
    }
}

impl BoundaryControl {
    pub fn is_stress(&self, component: usize) -> bool {
        self.mechanical[component] == MechControl::Stress
    }

    pub fn stress_controlled(&self) -> usize {
        self.mechanical
            .iter()
            .filter(|c| **c == MechControl::Stress)
            .count()
    }

    /// Number of degrees of freedom the solver has to find, i.e. the ones
    /// not prescribed directly as strain or temperature.
    pub fn free_dofs(&self, kind: BlockKind) -> usize {
        let thermal = match kind {
            BlockKind::Mechanical => 0,
            BlockKind::Thermomechanical => match self.thermal {
                ThermalControl::Temperature | ThermalControl::Free => 0,
                ThermalControl::Flux | ThermalControl::Convection => 1,
            },
        };
        self.stress_controlled() + thermal
    }

    pub fn has_free(&self) -> bool {
        self.thermal == ThermalControl::Free
            || self.mechanical.iter().any(|c| *c == MechControl::Free)
    }

    /// Permanently downgrade free codes: mechanical to stress, thermal to
    /// temperature.
    pub fn resolve_free(&mut self) {
        for c in &mut self.mechanical {
            if *c == MechControl::Free {
                *c = MechControl::Stress;
            }
        }
        if self.thermal == ThermalControl::Free {
            self.thermal = ThermalControl::Temperature;
        }
    }
}

impl fmt::Display for BoundaryControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.mechanical {
            write!(f, "{}", c.letter())?;
        }
        write!(f, " / {}", self.thermal)
    }
}
