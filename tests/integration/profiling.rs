//! Repetition of the profiling closure.

use meshflow::core::{repeat, TargetId};
use meshflow::step::{RecordingRunner, Tool};
use meshflow::workflow::{standard_engine, PROFILE_SAMPLE};
use meshflow::Error;

use crate::fixtures::{turbine, Harness, TestProject};

/// Steps per profiling sample in the turbine scenario with one approach:
/// uniform, go and ml, each over two testing cases.
const STEPS_PER_SAMPLE: usize = 6;

#[test]
fn test_repeat_five_full_executions() {
    let (_project, mut harness) = turbine(&["anisotropic"]);
    let engine = standard_engine(5);

    let samples = repeat(
        &engine,
        &TargetId::from(PROFILE_SAMPLE),
        5,
        &mut harness.pipeline,
    )
    .unwrap();

    assert_eq!(samples.len(), 5);
    assert_eq!(harness.runner.steps().len(), 5 * STEPS_PER_SAMPLE);
    for sample in &samples {
        assert_eq!(sample.executed.len(), 4);
    }
    // Every sample gets its own run id.
    assert_ne!(samples[0].run_id, samples[1].run_id);
}

#[test]
fn test_repeat_stops_after_failing_repetition() {
    let project = TestProject::new("turbine", &["caseA", "caseB"]);
    let params = project.params("turbine", 3, &["anisotropic"]);
    // First step of the third repetition.
    let runner = RecordingRunner::failing_at(2 * STEPS_PER_SAMPLE + 1);
    let mut harness = Harness::with_runner(params, &project.path, runner);
    let engine = standard_engine(5);

    let err = repeat(
        &engine,
        &TargetId::from(PROFILE_SAMPLE),
        5,
        &mut harness.pipeline,
    )
    .unwrap_err();

    assert!(matches!(err.root_cause(), Error::ExternalStepFailure { .. }));
    assert_eq!(harness.runner.steps().len(), 2 * STEPS_PER_SAMPLE + 1);
    let uniform_blocks = harness
        .phase_labels()
        .iter()
        .filter(|l| *l == "profile_uniform")
        .count();
    assert_eq!(uniform_blocks, 2);
}

#[test]
fn test_profile_target_uses_configured_repetitions() {
    let (_project, mut harness) = turbine(&["anisotropic"]);
    let engine = standard_engine(3);

    engine
        .run(&TargetId::from("profile"), &mut harness.pipeline)
        .unwrap();

    assert_eq!(harness.runner.steps().len(), 3 * STEPS_PER_SAMPLE);
    assert_eq!(harness.runner.count(Tool::ConvergenceMl), 3 * 2);
}

#[test]
fn test_profile_steps_carry_profile_options() {
    let project = TestProject::new("turbine", &["caseA"]);
    let params = project.params("turbine", 1, &["anisotropic"]);
    let mut harness = Harness::new(params, &project.path);
    harness.pipeline.work.profile_options = "-log_view".to_string();
    let engine = standard_engine(1);

    engine
        .run(&TargetId::from("profile"), &mut harness.pipeline)
        .unwrap();

    assert!(harness
        .runner
        .steps()
        .iter()
        .all(|step| step.solver_options == "-log_view"));
}

#[test]
fn test_repeat_whole_target_from_outside() {
    let project = TestProject::new("turbine", &["caseA"]);
    let params = project.params("turbine", 2, &["anisotropic"]);
    let mut harness = Harness::new(params, &project.path);
    let engine = standard_engine(5);

    repeat(&engine, &TargetId::from("network"), 2, &mut harness.pipeline).unwrap();

    // Memoisation resets between repetitions: training runs once per repetition.
    assert_eq!(harness.runner.count(Tool::Train), 2);
    assert_eq!(harness.runner.count(Tool::AdaptGo), 2 * 2);
}
