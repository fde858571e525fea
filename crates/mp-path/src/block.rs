//! Loading blocks and the complete loading path.

use std::fmt;

use mp_core::Real;
use serde::{Deserialize, Serialize};

use crate::step::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Mechanical,
    Thermomechanical,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Mechanical => f.write_str("mechanical"),
            BlockKind::Thermomechanical => f.write_str("thermomechanical"),
        }
    }
}

/// Ordered steps repeated `cycles` times.
#[derive(Debug, Clone)]
pub struct Block {
    /// 1-based block number.
    pub number: usize,
    pub kind: BlockKind,
    pub cycles: usize,
    pub steps: Vec<Step>,
}

impl Block {
    pub fn nsteps(&self) -> usize {
        self.steps.len()
    }
}

#[derive(Debug, Clone)]
pub struct LoadingPath {
    /// Temperature of the material at time zero.
    pub initial_temperature: Real,
    pub blocks: Vec<Block>,
}

impl LoadingPath {
    pub fn total_steps(&self) -> usize {
        self.blocks.iter().map(|b| b.cycles * b.nsteps()).sum()
    }
}

impl fmt::Display for LoadingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Initial temperature: {}", self.initial_temperature)?;
        for block in &self.blocks {
            writeln!(
                f,
                "Block {}: {}, {} cycle(s), {} step(s)",
                block.number,
                block.kind,
                block.cycles,
                block.nsteps()
            )?;
            for step in &block.steps {
                writeln!(f, "  {}", step.to_string().replace('\n', "\n  "))?;
            }
        }
        Ok(())
    }
}
