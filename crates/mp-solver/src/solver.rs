//! The nested block/cycle/step/increment/sub-step/Newton loop.

use mp_core::{Real, Vec6};
use mp_laws::{ConstitutiveEvaluator, EvalCall, EvalStatus};
use mp_path::{BlockKind, Cadence, CurrentState, LoadingPath, OutputSpec, Step, ThermalControl};
use mp_phase::{KindTag, RveTree};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, error, info, warn};

use crate::config::{SolverConfig, Strategy};
use crate::error::{FailureReason, SolverResult};
use crate::mixed::{MixedSystem, SubstepTarget};
use crate::output::{OutputSink, collect_records};
use crate::run::{RunState, RunSummary};

/// Cadence-by-time matching tolerance.
const OUTPUT_TIME_TOL: Real = 1e-12;

/// Residuals this many times the tolerance at the minimal sub-step abort
/// the run regardless of `force_continue`.
const DIVERGENCE_FACTOR: Real = 1000.0;

/// State payload a block of the given kind runs with.
pub fn kind_tag(kind: BlockKind) -> KindTag {
    match kind {
        BlockKind::Mechanical => KindTag::Mechanical,
        BlockKind::Thermomechanical => KindTag::Thermomechanical,
    }
}

/// Everything one sub-step needs from its step.
struct StepContext<'a> {
    step: &'a Step,
    kind: BlockKind,
    system: MixedSystem,
    /// Inverse of the reference operator under the fixed-operator strategy.
    fixed: Option<&'a DMatrix<Real>>,
    explicit: bool,
}

pub struct EquilibriumSolver {
    config: SolverConfig,
}

impl EquilibriumSolver {
    pub fn new(config: SolverConfig) -> SolverResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the whole loading path.
    ///
    /// The RVE must already hold the initial state. Records of accepted
    /// increments are written to `sink` as they are produced, so they
    /// remain available when the run fails part way.
    pub fn run(
        &self,
        path: &mut LoadingPath,
        rve: &mut RveTree,
        evaluator: &mut dyn ConstitutiveEvaluator,
        output: &OutputSpec,
        sink: &mut dyn OutputSink,
    ) -> SolverResult<RunSummary> {
        output.validate(path.blocks.len())?;
        let mut st = RunState::new();
        sink.begin(rve, output)?;

        let result = self.run_blocks(path, rve, evaluator, output, sink, &mut st);
        sink.finish()?;
        result?;

        st.summary.final_time = st.time;
        info!(
            increments = st.summary.increments,
            retractions = st.summary.retractions,
            iterations = st.summary.iterations,
            time = st.time,
            "run complete"
        );
        Ok(st.summary)
    }

    fn run_blocks(
        &self,
        path: &mut LoadingPath,
        rve: &mut RveTree,
        evaluator: &mut dyn ConstitutiveEvaluator,
        output: &OutputSpec,
        sink: &mut dyn OutputSink,
        st: &mut RunState,
    ) -> SolverResult<()> {
        for block in &mut path.blocks {
            st.location.block = block.number;
            st.location.cycle = 0;
            st.location.step = 0;
            st.location.increment = 0;
            info!(block = block.number, kind = %block.kind, cycles = block.cycles, "block start");
            self.start_block(block.kind, rve, evaluator, st)?;

            let cadence = output.cadence(block.number);
            st.reset_output_counters();
            let kind = block.kind;
            for cycle in 0..block.cycles {
                st.location.cycle = cycle + 1;
                for step in &mut block.steps {
                    st.location.step = step.id.step;
                    self.run_step(kind, step, rve, evaluator, output, cadence, sink, st)?;
                }
            }
        }
        Ok(())
    }

    /// Prepare the RVE for a block: switch the state kind if needed and get
    /// tangents from an instantaneous first call.
    fn start_block(
        &self,
        kind: BlockKind,
        rve: &mut RveTree,
        evaluator: &mut dyn ConstitutiveEvaluator,
        st: &mut RunState,
    ) -> SolverResult<()> {
        let tag = kind_tag(kind);
        if rve.kind() != tag {
            info!(from = ?rve.kind(), to = ?tag, "switching state kind");
            rve.retag(tag);
        }
        rve.reset_tangents();
        {
            let g = rve.global_mut();
            g.detot = Vec6::zeros();
            g.dtemperature = 0.0;
        }
        st.dtime = 0.0;
        let status = evaluator
            .evaluate(rve, &EvalCall::first(st.time))
            .map_err(|e| st.failure(FailureReason::Evaluator(e.to_string())))?;
        if let EvalStatus::Reduce(f) = status {
            warn!(factor = f, "step reduction requested by the first call of a block; ignored");
        }
        st.eval_dtime = 0.0;
        st.reference = *rve.global().stiffness();
        rve.set_start();
        st.error = 0.0;
        st.carry = None;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn run_step(
        &self,
        kind: BlockKind,
        step: &mut Step,
        rve: &mut RveTree,
        evaluator: &mut dyn ConstitutiveEvaluator,
        output: &OutputSpec,
        cadence: Cadence,
        sink: &mut dyn OutputSink,
        st: &mut RunState,
    ) -> SolverResult<()> {
        let current = {
            let g = rve.global();
            CurrentState {
                time: st.time,
                stress: g.sigma,
                strain: g.etot,
                temperature: g.temperature,
            }
        };
        step.generate(&current)?;

        let control = step.control;
        let system = MixedSystem {
            kind,
            control,
            penalty: self.config.penalty,
            convection: step
                .convection()
                .map(|h| (h, step.reference_temperature)),
        };
        let fixed = match (self.config.strategy, kind) {
            (Strategy::FixedOperator, BlockKind::Mechanical) => Some(
                system
                    .mechanical_operator(&st.reference)
                    .try_inverse()
                    .ok_or_else(|| st.failure(FailureReason::SingularJacobian))?,
            ),
            _ => None,
        };
        debug!(
            step = %step.id,
            control = %control,
            increments = step.table().len(),
            "step start"
        );

        st.substep = Default::default();
        st.carry = None;
        st.error = 0.0;
        st.location.increment = 0;

        for inc in 0..step.table().len() {
            st.location.increment = inc + 1;
            if let Some(carry) = st.carry.take() {
                step.fold_residual(inc, carry.as_slice());
            }

            let ctx = StepContext {
                step: &*step,
                kind,
                system,
                fixed: fixed.as_ref(),
                explicit: control.free_dofs(kind) == 0,
            };
            let increment_time = self.run_increment(&ctx, inc, rve, evaluator, st)?;
            st.summary.increments += 1;

            let due = match cadence {
                Cadence::EveryIncrements(n) => {
                    st.output_count += 1;
                    st.output_count >= n
                }
                Cadence::EveryTime(interval) => {
                    st.output_time += increment_time;
                    (st.output_time - interval).abs() < OUTPUT_TIME_TOL
                }
            };
            if due {
                for record in collect_records(rve, output, st.location, st.time) {
                    sink.write(&record)?;
                }
                st.summary.outputs += 1;
                st.reset_output_counters();
            }
        }
        Ok(())
    }

    /// Drive `tinc` from 0 to 1. Returns the time covered by the increment.
    fn run_increment(
        &self,
        ctx: &StepContext<'_>,
        inc: usize,
        rve: &mut RveTree,
        evaluator: &mut dyn ConstitutiveEvaluator,
        st: &mut RunState,
    ) -> SolverResult<Real> {
        let substep = ctx.step.substep;
        let table = ctx.step.table();
        st.substep.begin_increment();
        let mut covered = 0.0;

        while !st.substep.increment_done() {
            substep.compute_inc(&mut st.substep);
            let dtinc = st.substep.dtinc;
            let target = SubstepTarget::from_table(
                table,
                inc,
                dtinc,
                &ctx.system.control,
                st.carry.as_ref(),
            );
            st.dtime = dtinc * table.times[inc];

            if ctx.explicit {
                self.explicit_substep(ctx, &target, rve, evaluator, st)?;
            } else {
                self.implicit_substep(ctx, &target, rve, evaluator, st)?;
            }

            self.apply_policy(ctx, st)?;
            if st.substep.tnew_dt < 1.0 {
                rve.to_start();
                st.summary.retractions += 1;
                debug!(
                    location = %st.location,
                    fraction = st.substep.tinc,
                    substep = dtinc,
                    error = st.error,
                    "sub-step retracted"
                );
                continue;
            }

            st.substep.accept();
            st.time += st.dtime;
            covered += st.dtime;
            rve.set_start();
            st.summary.substeps += 1;
            if st.error <= self.config.tolerance {
                st.carry = None;
            }
        }
        Ok(covered)
    }

    /// No unknowns: apply the target delta and evaluate once.
    fn explicit_substep(
        &self,
        ctx: &StepContext<'_>,
        target: &SubstepTarget,
        rve: &mut RveTree,
        evaluator: &mut dyn ConstitutiveEvaluator,
        st: &mut RunState,
    ) -> SolverResult<()> {
        {
            let g = rve.global_mut();
            g.detot = target.mechanical;
            g.dtemperature = target.thermal;
        }
        rve.to_start();
        let status = self.evaluate(rve, evaluator, st)?;
        if let EvalStatus::Reduce(f) = status {
            st.substep.tnew_dt = f;
        }
        st.iterations = 0;
        st.error = 0.0;
        st.residual = DVector::zeros(ctx.system.size());
        Ok(())
    }

    /// Newton iteration on the mixed system.
    fn implicit_substep(
        &self,
        ctx: &StepContext<'_>,
        target: &SubstepTarget,
        rve: &mut RveTree,
        evaluator: &mut dyn ConstitutiveEvaluator,
        st: &mut RunState,
    ) -> SolverResult<()> {
        let thermal_unknown = ctx.kind == BlockKind::Thermomechanical;
        let prescribed_dt = match ctx.step.control.thermal {
            ThermalControl::Temperature | ThermalControl::Free => target.thermal,
            _ => 0.0,
        };
        {
            let g = rve.global_mut();
            g.detot = Vec6::zeros();
            g.dtemperature = if thermal_unknown { 0.0 } else { prescribed_dt };
        }
        st.residual = ctx.system.residual(rve.global(), target);
        st.error = 1.0;
        st.iterations = 0;

        while st.error > self.config.tolerance && st.iterations < self.config.max_iterations {
            let delta = match ctx.fixed {
                Some(inverse) => {
                    let correction = ctx.system.internal_stress_correction(rve.global());
                    -(inverse * (&st.residual - correction))
                }
                None => {
                    let k = ctx.system.jacobian(rve.global(), st.eval_dtime);
                    k.lu()
                        .solve(&(-&st.residual))
                        .ok_or_else(|| st.failure(FailureReason::SingularJacobian))?
                }
            };
            {
                let g = rve.global_mut();
                for k in 0..6 {
                    g.detot[k] += delta[k];
                }
                if thermal_unknown {
                    g.dtemperature += delta[6];
                }
            }

            rve.to_start();
            let status = self.evaluate(rve, evaluator, st)?;
            st.residual = ctx.system.residual(rve.global(), target);
            st.iterations += 1;
            st.summary.iterations += 1;
            st.error = st.residual.norm();

            if let EvalStatus::Reduce(f) = status {
                st.substep.tnew_dt = f;
                break;
            }
        }
        Ok(())
    }

    fn evaluate(
        &self,
        rve: &mut RveTree,
        evaluator: &mut dyn ConstitutiveEvaluator,
        st: &mut RunState,
    ) -> SolverResult<EvalStatus> {
        let call = EvalCall::new(st.time, st.dtime);
        let status = evaluator
            .evaluate(rve, &call)
            .map_err(|e| st.failure(FailureReason::Evaluator(e.to_string())))?;
        st.eval_dtime = st.dtime;
        Ok(status)
    }

    /// Decide what happens to the sub-step just attempted: fail the run,
    /// accept it (possibly out of tolerance), or ask for a smaller or larger
    /// next sub-step through `tnew_dt`.
    fn apply_policy(&self, ctx: &StepContext<'_>, st: &mut RunState) -> SolverResult<()> {
        let cfg = &self.config;
        let at_minimal = ctx.step.substep.at_minimal(&st.substep);

        if at_minimal && st.substep.tnew_dt < 1.0 {
            return Err(self.fail(st, FailureReason::StepReductionBelowMinimum));
        }
        if at_minimal && st.error > DIVERGENCE_FACTOR * cfg.tolerance {
            return Err(self.fail(st, FailureReason::Diverged));
        }
        if st.error > cfg.tolerance {
            if !at_minimal {
                st.substep.tnew_dt = st.substep.tnew_dt.min(cfg.shrink_factor);
            } else if cfg.force_continue {
                warn!(
                    location = %st.location,
                    fraction = st.substep.tinc,
                    error = st.error,
                    "accepting unconverged state at the minimal sub-step; residual carried forward"
                );
                st.substep.tnew_dt = 1.0;
                st.carry = Some(st.residual.clone());
                st.summary.forced_continuations += 1;
            } else {
                return Err(self.fail(st, FailureReason::NotConverged));
            }
        }
        if st.iterations < cfg.min_iterations && st.substep.tnew_dt >= 1.0 {
            st.substep.tnew_dt = cfg.grow_factor;
        }
        Ok(())
    }

    fn fail(&self, st: &RunState, reason: FailureReason) -> crate::error::SolverError {
        let failure = st.failure(reason);
        error!(%failure, "run aborted");
        failure.into()
    }
}
