//! What to persist, and how often.

use mp_core::Real;
use serde::{Deserialize, Serialize};

use crate::error::{PathError, PathResult};

/// Output cadence of one block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// Every n accepted increments.
    EveryIncrements(usize),
    /// Every time the accumulated increment time reaches the interval.
    EveryTime(Real),
}

impl Default for Cadence {
    fn default() -> Self {
        Cadence::EveryIncrements(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatevSelection {
    #[default]
    None,
    All,
    /// Inclusive index ranges.
    Ranges(Vec<[usize; 2]>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Voigt indices of the strain components written out.
    #[serde(default = "all_components")]
    pub strain: Vec<usize>,
    /// Voigt indices of the stress components written out.
    #[serde(default = "all_components")]
    pub stress: Vec<usize>,
    #[serde(default)]
    pub statev: StatevSelection,
    /// One entry per block; missing entries fall back to every increment.
    #[serde(default)]
    pub cadence: Vec<Cadence>,
}

fn all_components() -> Vec<usize> {
    (0..6).collect()
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            strain: all_components(),
            stress: all_components(),
            statev: StatevSelection::None,
            cadence: Vec::new(),
        }
    }
}

impl OutputSpec {
    /// Cadence of the block with 1-based number `block`.
    pub fn cadence(&self, block: usize) -> Cadence {
        block
            .checked_sub(1)
            .and_then(|i| self.cadence.get(i))
            .copied()
            .unwrap_or_default()
    }

    /// Internal-state indices to persist, clipped to the vector length.
    pub fn statev_indices(&self, nstatev: usize) -> Vec<usize> {
        match &self.statev {
            StatevSelection::None => Vec::new(),
            StatevSelection::All => (0..nstatev).collect(),
            StatevSelection::Ranges(ranges) => {
                if nstatev == 0 {
                    return Vec::new();
                }
                let mut keep = vec![false; nstatev];
                let mut out = Vec::new();
                for [lo, hi] in ranges {
                    for i in *lo..=(*hi).min(nstatev - 1) {
                        if !keep[i] {
                            keep[i] = true;
                            out.push(i);
                        }
                    }
                }
                out
            }
        }
    }

    pub fn validate(&self, nblocks: usize) -> PathResult<()> {
        for idx in self.strain.iter().chain(&self.stress) {
            if *idx >= 6 {
                return Err(PathError::InvalidOutput {
                    what: format!("component index {idx} outside 0..6"),
                });
            }
        }
        if self.cadence.len() > nblocks {
            return Err(PathError::InvalidOutput {
                what: format!(
                    "{} cadences given for {nblocks} block(s)",
                    self.cadence.len()
                ),
            });
        }
        for c in &self.cadence {
            let ok = match c {
                Cadence::EveryIncrements(n) => *n >= 1,
                Cadence::EveryTime(t) => *t > 0.0,
            };
            if !ok {
                return Err(PathError::InvalidOutput {
                    what: format!("cadence {c:?} must be positive"),
                });
            }
        }
        if let StatevSelection::Ranges(ranges) = &self.statev {
            if let Some([lo, hi]) = ranges.iter().find(|[lo, hi]| lo > hi) {
                return Err(PathError::InvalidOutput {
                    what: format!("internal-state range [{lo}, {hi}] is reversed"),
                });
            }
        }
        Ok(())
    }
}
