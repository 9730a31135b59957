//! Fail-fast behaviour and configuration errors.

use meshflow::app::App;
use meshflow::config::Config;
use meshflow::core::{Action, Engine, TargetId};
use meshflow::params;
use meshflow::step::{RecordingRunner, Tool};
use meshflow::workflow::{standard_engine, Pipeline};
use meshflow::Error;

use crate::fixtures::{Harness, TestProject};

#[test]
fn test_failing_step_aborts_phase_and_run() {
    let project = TestProject::new("turbine", &["caseA", "caseB"]);
    let params = project.params("turbine", 3, &["anisotropic"]);
    // Steps 1-5 are meshgen, 6 is plot_config, 7 is the first feature run.
    let runner = RecordingRunner::failing_at(8);
    let mut harness = Harness::with_runner(params, &project.path, runner);
    let engine = standard_engine(5);

    let err = engine
        .run(&TargetId::from("all"), &mut harness.pipeline)
        .unwrap_err();

    assert!(matches!(err.root_cause(), Error::ExternalStepFailure { .. }));
    assert!(matches!(err, Error::DependencyFailure { .. }));
    // Nothing after the failing feature run was attempted.
    assert_eq!(harness.runner.steps().len(), 8);
    assert_eq!(harness.runner.count(Tool::Train), 0);
    // Only the completed phase was logged.
    assert_eq!(harness.phase_labels(), vec!["setup"]);
}

#[test]
fn test_failure_in_requested_target_is_not_wrapped() {
    let project = TestProject::new("turbine", &["caseA"]);
    let params = project.params("turbine", 1, &["anisotropic"]);
    let runner = RecordingRunner::failing_at(1);
    let mut harness = Harness::with_runner(params, &project.path, runner);
    let engine = standard_engine(5);

    let err = engine
        .run(&TargetId::from("uniform"), &mut harness.pipeline)
        .unwrap_err();

    assert!(matches!(err, Error::ExternalStepFailure { .. }));
    assert!(harness.log.blocks().is_empty());
}

#[test]
fn test_empty_case_list_rejected_before_any_step() {
    let project = TestProject::new("turbine", &[]);
    let approaches = vec!["anisotropic".to_string()];

    let err = params::resolve("turbine", 0, &project.manifest("turbine"), &approaches, "")
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    let config = Config {
        model: "turbine".to_string(),
        num_training_cases: 0,
        ..Config::default()
    };
    let err = App::new(&config, &project.path, true).err().unwrap();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(!project.path.join("timing.log").exists());
}

#[test]
fn test_unknown_target_is_configuration_error() {
    let project = TestProject::new("turbine", &["caseA"]);
    let params = project.params("turbine", 1, &["anisotropic"]);
    let mut harness = Harness::new(params, &project.path);
    let engine = standard_engine(5);

    let err = engine
        .run(&TargetId::from("deploy"), &mut harness.pipeline)
        .unwrap_err();

    assert!(matches!(err, Error::Configuration(_)));
    assert!(harness.runner.steps().is_empty());
}

#[test]
fn test_dynamic_cycle_rejected_before_any_step() {
    let project = TestProject::new("turbine", &["caseA"]);
    let params = project.params("turbine", 1, &["anisotropic"]);
    let mut harness = Harness::new(params, &project.path);

    let mut engine: Engine<Pipeline> = standard_engine(5);
    // network already depends on features; this closes the loop.
    engine.register(
        "features",
        &["network"],
        vec![Action::run(|p: &mut Pipeline| {
            p.phase("features", meshflow::workflow::phases::features)
        })],
    );

    let err = engine
        .run(&TargetId::from("setup"), &mut harness.pipeline)
        .unwrap_err();

    assert!(err.to_string().contains("cycle"));
    assert!(harness.runner.steps().is_empty());
}
