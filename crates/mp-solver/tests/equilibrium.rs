mod common;

use common::*;
use mp_core::{PhaseId, Vec6};
use mp_laws::{ConstitutiveEvaluator, EvalCall, PhaseEvaluator};
use mp_path::{Cadence, OutputSpec};
use mp_phase::KindTag;
use mp_solver::{
    EquilibriumSolver, FailureReason, Frame, MemorySink, NullSink, SolverConfig, SolverError,
    Strategy,
};
use proptest::prelude::*;

fn solver(config: SolverConfig) -> EquilibriumSolver {
    EquilibriumSolver::new(config).expect("valid config")
}

#[test]
fn zero_free_dof_step_is_one_direct_call() {
    let yaml = single_block(
        "mechanical",
        r#"      - mode: monotonic
        duration: 1.0
        increments: 1
        mechanical:
          - { control: strain, target: 0.002 }
          - { control: strain, target: -0.0005 }
          - { control: strain }
          - { control: strain, target: 0.001 }
          - { control: strain }
          - { control: strain }
"#,
    );
    let mut p = path(&yaml);
    let props = vec![1000.0, 0.25, 0.0];
    let mut rve = eliso_rve(props.clone(), KindTag::Mechanical);
    let mut ev = Counting::new(&rve);
    let summary = solver(SolverConfig::default())
        .run(&mut p, &mut rve, &mut ev, &OutputSpec::default(), &mut NullSink)
        .unwrap();

    // Block-start call plus exactly one evaluation, no Newton iteration.
    assert_eq!(ev.calls, 2);
    assert_eq!(summary.iterations, 0);

    let mut direct = eliso_rve(props, KindTag::Mechanical);
    let mut law = PhaseEvaluator::from_rve(&direct).unwrap();
    direct.global_mut().detot = Vec6::new(0.002, -0.0005, 0.0, 0.001, 0.0, 0.0);
    law.evaluate(&mut direct, &EvalCall::new(0.0, 1.0)).unwrap();
    assert_eq!(rve.global().sigma, direct.global().sigma);
}

#[test]
fn uniaxial_tension_of_elastic_bar() {
    let yaml = single_block("mechanical", &uniaxial_step("strain", 0.001, 5, ""));
    let mut p = path(&yaml);
    let mut rve = eliso_rve(vec![200_000.0, 0.3, 0.0], KindTag::Mechanical);
    let mut ev = PhaseEvaluator::from_rve(&rve).unwrap();
    let mut sink = MemorySink::new();
    let summary = solver(SolverConfig::default())
        .run(&mut p, &mut rve, &mut ev, &OutputSpec::default(), &mut sink)
        .unwrap();

    let g = rve.global();
    assert!((g.sigma[0] - 200.0).abs() < 1e-6);
    assert!(g.sigma.rows(1, 5).norm() < 1e-6);
    assert!((g.etot[1] + 0.3 * 0.001).abs() < 1e-10);
    assert!((g.etot[2] - g.etot[1]).abs() < 1e-12);
    assert_eq!(summary.increments, 5);
    assert_eq!(summary.final_time, 5.0);
    assert_eq!(summary.retractions, 0);

    // One record per increment and frame for the single phase.
    assert_eq!(sink.records.len(), 10);
    let global: Vec<_> = sink.series(PhaseId::ROOT, Frame::Global).collect();
    assert_eq!(global.len(), 5);
    assert_eq!(global[4].location.increment, 5);
    assert_eq!(global[4].location.block, 1);
    assert!((global[2].strain[0] - 0.0006).abs() < 1e-12);
}

#[test]
fn fixed_operator_converges_in_one_iteration() {
    let yaml = single_block("mechanical", &uniaxial_step("stress", 150.0, 1, ""));
    let mut p = path(&yaml);
    let mut rve = eliso_rve(vec![70_000.0, 0.33, 0.0], KindTag::Mechanical);
    let mut ev = PhaseEvaluator::from_rve(&rve).unwrap();
    let config = SolverConfig {
        strategy: Strategy::FixedOperator,
        ..SolverConfig::default()
    };
    let summary = solver(config)
        .run(&mut p, &mut rve, &mut ev, &OutputSpec::default(), &mut NullSink)
        .unwrap();
    assert_eq!(summary.iterations, 1);
    assert!((rve.global().etot[0] - 150.0 / 70_000.0).abs() < 1e-12);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn fixed_operator_one_iteration_for_any_stress_target(
        targets in prop::array::uniform6(-500.0..500.0_f64),
    ) {
        let components: String = targets
            .iter()
            .map(|t| format!("          - {{ control: stress, target: {t} }}\n"))
            .collect();
        let yaml = single_block(
            "mechanical",
            &format!(
                "      - mode: monotonic\n        duration: 1.0\n        increments: 1\n        mechanical:\n{components}"
            ),
        );
        let mut p = path(&yaml);
        let mut rve = eliso_rve(vec![1000.0, 0.2, 0.0], KindTag::Mechanical);
        let mut ev = PhaseEvaluator::from_rve(&rve).unwrap();
        let config = SolverConfig { strategy: Strategy::FixedOperator, ..SolverConfig::default() };
        let summary = solver(config)
            .run(&mut p, &mut rve, &mut ev, &OutputSpec::default(), &mut NullSink)
            .unwrap();
        prop_assert_eq!(summary.iterations, 1);
        for k in 0..6 {
            prop_assert!((rve.global().sigma[k] - targets[k]).abs() < 1e-6);
        }
    }
}

#[test]
fn single_reduction_gives_one_retraction_and_no_extra_output() {
    let yaml = single_block("mechanical", &uniaxial_step("strain", 0.002, 2, ""));
    let mut p = path(&yaml);
    let mut rve = eliso_rve(vec![1000.0, 0.3, 0.0], KindTag::Mechanical);
    let mut ev = Counting::new(&rve);
    // Call 1 is the block start; call 2 is the first Newton trial.
    ev.reduce_on = Some(2);
    let mut sink = MemorySink::new();
    let summary = solver(SolverConfig::default())
        .run(&mut p, &mut rve, &mut ev, &OutputSpec::default(), &mut sink)
        .unwrap();

    assert_eq!(summary.retractions, 1);
    assert_eq!(summary.increments, 2);
    assert_eq!(summary.substeps, 3);
    assert_eq!(sink.records.len(), 4);
    let times: Vec<f64> = sink
        .series(PhaseId::ROOT, Frame::Global)
        .map(|r| r.time)
        .collect();
    assert_eq!(times, vec![1.0, 2.0]);
    assert!((rve.global().etot[0] - 0.002).abs() < 1e-12);
}

fn stuck_config(force_continue: bool) -> SolverConfig {
    SolverConfig {
        max_iterations: 20,
        force_continue,
        ..SolverConfig::default()
    }
}

const STUCK_SUBSTEP: &str = "        substep: { initial: 1.0, minimal: 0.25, growth: 1.0 }\n";

#[test]
fn huge_residual_at_minimal_substep_fails_even_when_forced() {
    let yaml = single_block("mechanical", &uniaxial_step("stress", 0.0, 3, STUCK_SUBSTEP));
    let mut p = path(&yaml);
    let mut rve = eliso_rve(vec![1000.0, 0.3, 0.0], KindTag::Mechanical);
    // Healthy for the block start and the first increment only.
    let mut ev = Stuck {
        healthy: 2,
        offset: 2000.0 * 1e-6,
        calls: 0,
    };
    let mut sink = MemorySink::new();
    let err = solver(stuck_config(true))
        .run(&mut p, &mut rve, &mut ev, &OutputSpec::default(), &mut sink)
        .unwrap_err();

    let failure = err.failure().expect("run failure");
    assert_eq!(failure.reason, FailureReason::Diverged);
    assert_eq!(failure.location.increment, 2);
    assert_eq!(failure.location.step, 1);
    // The first increment was written before the failure.
    assert_eq!(sink.records.len(), 2);
    // 1 + 3 shrinking attempts of 20 iterations, plus the healthy calls.
    assert_eq!(ev.calls, 2 + 3 * 20);
}

#[test]
fn moderate_residual_at_minimal_substep_fails_without_force() {
    let yaml = single_block("mechanical", &uniaxial_step("stress", 0.0, 1, STUCK_SUBSTEP));
    let mut p = path(&yaml);
    let mut rve = eliso_rve(vec![1000.0, 0.3, 0.0], KindTag::Mechanical);
    let mut ev = Stuck {
        healthy: 1,
        offset: 5e-4,
        calls: 0,
    };
    let err = solver(stuck_config(false))
        .run(&mut p, &mut rve, &mut ev, &OutputSpec::default(), &mut NullSink)
        .unwrap_err();
    assert!(matches!(
        err,
        SolverError::Failed(ref f) if f.reason == FailureReason::NotConverged
    ));
}

#[test]
fn moderate_residual_at_minimal_substep_is_accepted_when_forced() {
    let yaml = single_block("mechanical", &uniaxial_step("stress", 0.0, 1, STUCK_SUBSTEP));
    let mut p = path(&yaml);
    let mut rve = eliso_rve(vec![1000.0, 0.3, 0.0], KindTag::Mechanical);
    // Each forced acceptance carries its residual into the next target, so
    // the residual grows by the offset per sub-step and stays below 1000x.
    let mut ev = Stuck {
        healthy: 1,
        offset: 2e-4,
        calls: 0,
    };
    let summary = solver(stuck_config(true))
        .run(&mut p, &mut rve, &mut ev, &OutputSpec::default(), &mut NullSink)
        .unwrap();
    assert_eq!(summary.retractions, 2);
    assert_eq!(summary.forced_continuations, 4);
    assert_eq!(summary.increments, 1);
}

#[test]
fn reduction_below_minimal_is_fatal() {
    let yaml = single_block(
        "mechanical",
        &uniaxial_step(
            "strain",
            0.001,
            1,
            "        substep: { initial: 0.5, minimal: 0.5, growth: 1.0 }\n",
        ),
    );
    let mut p = path(&yaml);
    let mut rve = eliso_rve(vec![1000.0, 0.3, 0.0], KindTag::Mechanical);
    let mut ev = Counting::new(&rve);
    ev.reduce_on = Some(2);
    let err = solver(SolverConfig::default())
        .run(&mut p, &mut rve, &mut ev, &OutputSpec::default(), &mut NullSink)
        .unwrap_err();
    assert_eq!(
        err.failure().map(|f| f.reason.clone()),
        Some(FailureReason::StepReductionBelowMinimum)
    );
}

#[test]
fn output_by_accumulated_time() {
    let yaml = single_block("mechanical", &uniaxial_step("strain", 0.001, 6, ""));
    let mut p = path(&yaml);
    let mut rve = eliso_rve(vec![1000.0, 0.3, 0.0], KindTag::Mechanical);
    let mut ev = PhaseEvaluator::from_rve(&rve).unwrap();
    let spec = OutputSpec {
        cadence: vec![Cadence::EveryTime(2.0)],
        ..OutputSpec::default()
    };
    let mut sink = MemorySink::new();
    let summary = solver(SolverConfig::default())
        .run(&mut p, &mut rve, &mut ev, &spec, &mut sink)
        .unwrap();
    assert_eq!(summary.outputs, 3);
    let increments: Vec<usize> = sink
        .series(PhaseId::ROOT, Frame::Local)
        .map(|r| r.location.increment)
        .collect();
    assert_eq!(increments, vec![2, 4, 6]);
}

#[test]
fn time_cadence_needs_an_exact_match() {
    let yaml = single_block("mechanical", &uniaxial_step("strain", 0.001, 6, ""));
    let mut p = path(&yaml);
    let mut rve = eliso_rve(vec![1000.0, 0.3, 0.0], KindTag::Mechanical);
    let mut ev = PhaseEvaluator::from_rve(&rve).unwrap();
    let spec = OutputSpec {
        cadence: vec![Cadence::EveryTime(1.5)],
        ..OutputSpec::default()
    };
    let mut sink = MemorySink::new();
    let summary = solver(SolverConfig::default())
        .run(&mut p, &mut rve, &mut ev, &spec, &mut sink)
        .unwrap();
    assert_eq!(summary.increments, 6);
    assert_eq!(summary.outputs, 0);
    assert!(sink.records.is_empty());
}

#[test]
fn cycles_repeat_steps_from_the_current_state() {
    let steps = format!(
        "{}{}",
        uniaxial_step("strain", 0.001, 2, ""),
        uniaxial_step("strain", -0.001, 2, "")
    );
    let yaml = single_block("mechanical", &steps).replace(
        "  - kind: mechanical\n",
        "  - kind: mechanical\n    cycles: 3\n",
    );
    let mut p = path(&yaml);
    let mut rve = eliso_rve(vec![1000.0, 0.3, 0.0], KindTag::Mechanical);
    let mut ev = PhaseEvaluator::from_rve(&rve).unwrap();
    let mut sink = MemorySink::new();
    let summary = solver(SolverConfig::default())
        .run(&mut p, &mut rve, &mut ev, &OutputSpec::default(), &mut sink)
        .unwrap();
    assert_eq!(summary.increments, 12);
    assert!((rve.global().etot[0] + 0.001).abs() < 1e-12);
    let last = sink.records.last().unwrap();
    assert_eq!(last.location.cycle, 3);
    assert_eq!(last.location.step, 2);
}
