#![allow(dead_code)]

use std::path::Path;

use mp_core::{Mat6, Vec6};
use mp_laws::{ConstitutiveEvaluator, EvalCall, EvalStatus, LawResult, PhaseEvaluator};
use mp_path::{LoadingPath, LoadingPathDef};
use mp_phase::{KindTag, MaterialProps, RveBuilder, RveTree, StateKind};

pub const T0: f64 = 300.0;

pub fn path(yaml: &str) -> LoadingPath {
    let def: LoadingPathDef = serde_yaml::from_str(yaml).expect("loading path yaml");
    def.build(Path::new(".")).expect("valid loading path")
}

pub fn eliso_rve(props: Vec<f64>, tag: KindTag) -> RveTree {
    RveBuilder::new(MaterialProps::new("ELISO", props))
        .build(tag, T0)
        .expect("single phase rve")
}

/// Real elastic law with call counting and an optional scripted reduction.
pub struct Counting {
    pub inner: PhaseEvaluator,
    pub calls: usize,
    /// 1-based call number answered with `Reduce(0.5)`.
    pub reduce_on: Option<usize>,
}

impl Counting {
    pub fn new(rve: &RveTree) -> Self {
        Self {
            inner: PhaseEvaluator::from_rve(rve).expect("evaluator"),
            calls: 0,
            reduce_on: None,
        }
    }
}

impl ConstitutiveEvaluator for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn mechanical(&mut self, rve: &mut RveTree, call: &EvalCall) -> LawResult<EvalStatus> {
        self.calls += 1;
        if self.reduce_on == Some(self.calls) {
            return Ok(EvalStatus::Reduce(0.5));
        }
        self.inner.mechanical(rve, call)
    }

    fn thermomechanical(&mut self, rve: &mut RveTree, call: &EvalCall) -> LawResult<EvalStatus> {
        self.calls += 1;
        self.inner.thermomechanical(rve, call)
    }
}

/// Behaves elastically (`σ = σ_start + k·Δε`) for the first `healthy`
/// calls, then answers a constant stress offset whatever the strain.
pub struct Stuck {
    pub healthy: usize,
    pub offset: f64,
    pub calls: usize,
}

impl ConstitutiveEvaluator for Stuck {
    fn name(&self) -> &str {
        "stuck"
    }

    fn mechanical(&mut self, rve: &mut RveTree, _call: &EvalCall) -> LawResult<EvalStatus> {
        self.calls += 1;
        let stuck = self.calls > self.healthy;
        let g = rve.global_mut();
        g.sigma = if stuck {
            g.sigma_start + Vec6::new(self.offset, 0.0, 0.0, 0.0, 0.0, 0.0)
        } else {
            g.sigma_start + g.detot * 1000.0
        };
        if let StateKind::Mechanical(m) = &mut g.kind {
            m.lt = Mat6::identity() * 1000.0;
        }
        Ok(EvalStatus::Converged)
    }
}

/// Mechanical step: component 11 as given, every other component at zero
/// stress.
pub fn uniaxial_step(control11: &str, target: f64, increments: usize, extra: &str) -> String {
    format!(
        r#"      - mode: monotonic
        duration: {increments}.0
        increments: {increments}
{extra}        mechanical:
          - {{ control: {control11}, target: {target} }}
          - {{ control: stress }}
          - {{ control: stress }}
          - {{ control: stress }}
          - {{ control: stress }}
          - {{ control: stress }}
"#
    )
}

pub fn single_block(kind: &str, steps: &str) -> String {
    format!(
        "initial_temperature: {T0}\nblocks:\n  - kind: {kind}\n    steps:\n{steps}"
    )
}
