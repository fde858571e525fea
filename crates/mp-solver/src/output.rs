//! Output records and the sink seam.

use std::fmt;

use mp_core::{PhaseId, Real};
use mp_path::OutputSpec;
use mp_phase::{RveTree, StateVariables};

use crate::error::{Location, SolverResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    Global,
    Local,
}

impl Frame {
    pub const BOTH: [Frame; 2] = [Frame::Global, Frame::Local];

    pub fn as_str(self) -> &'static str {
        match self {
            Frame::Global => "global",
            Frame::Local => "local",
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted row for one phase in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub phase: PhaseId,
    /// User-facing phase number from the material properties.
    pub phase_number: u32,
    pub frame: Frame,
    pub location: Location,
    pub time: Real,
    pub temperature: Real,
    /// Present for thermomechanical states.
    pub flux: Option<Real>,
    pub strain: Vec<Real>,
    pub stress: Vec<Real>,
    pub statev: Vec<Real>,
}

/// Destination of accepted-increment records.
pub trait OutputSink {
    /// Called once before the first block.
    fn begin(&mut self, _rve: &RveTree, _spec: &OutputSpec) -> SolverResult<()> {
        Ok(())
    }

    fn write(&mut self, record: &OutputRecord) -> SolverResult<()>;

    /// Called once after the last block, and before returning a failure.
    fn finish(&mut self) -> SolverResult<()> {
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<OutputRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of one phase and frame, in write order.
    pub fn series(&self, phase: PhaseId, frame: Frame) -> impl Iterator<Item = &OutputRecord> {
        self.records
            .iter()
            .filter(move |r| r.phase == phase && r.frame == frame)
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, record: &OutputRecord) -> SolverResult<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write(&mut self, _record: &OutputRecord) -> SolverResult<()> {
        Ok(())
    }
}

fn record(
    sv: &StateVariables,
    spec: &OutputSpec,
    phase: PhaseId,
    phase_number: u32,
    frame: Frame,
    location: Location,
    time: Real,
) -> OutputRecord {
    OutputRecord {
        phase,
        phase_number,
        frame,
        location,
        time,
        temperature: sv.current_temperature(),
        flux: sv.flux(),
        strain: spec.strain.iter().map(|k| sv.etot[*k]).collect(),
        stress: spec.stress.iter().map(|k| sv.sigma[*k]).collect(),
        statev: spec
            .statev_indices(sv.nstatev())
            .into_iter()
            .map(|i| sv.statev[i])
            .collect(),
    }
}

/// Records of every phase (top-down) in both frames.
pub fn collect_records(
    rve: &RveTree,
    spec: &OutputSpec,
    location: Location,
    time: Real,
) -> Vec<OutputRecord> {
    let mut out = Vec::with_capacity(2 * rve.len());
    for id in rve.preorder() {
        let Ok(node) = rve.node(id) else {
            continue;
        };
        let number = node.material().number;
        for frame in Frame::BOTH {
            let sv = match frame {
                Frame::Global => &node.state.global,
                Frame::Local => &node.state.local,
            };
            out.push(record(sv, spec, id, number, frame, location, time));
        }
    }
    out
}
