//! Append-only timing log across separate runs.

use meshflow::app::App;
use meshflow::config::Config;
use meshflow::core::TargetId;
use meshflow::git::{FixedRevision, Revision};
use meshflow::layout::OutputLayout;
use meshflow::step::{RecordingRunner, Tool};
use meshflow::timing::{FileLogSink, TimingLogger};
use meshflow::workflow::{standard_engine, Pipeline, Workspace};

use crate::fixtures::TestProject;

/// A fresh pipeline per call, as a new process would build it.
fn file_pipeline(project: &TestProject, runner: &RecordingRunner) -> Pipeline {
    let params = project.params("turbine", 2, &["anisotropic"]);
    let work = Workspace::new(
        params,
        OutputLayout::new(&project.path),
        Box::new(runner.clone()),
    );
    let timing = TimingLogger::new(
        Box::new(FileLogSink::new(&project.path.join("timing.log"))),
        Box::new(FixedRevision(Revision {
            commit: "feedface".to_string(),
            summary: "Fixture".to_string(),
        })),
    );
    Pipeline::new(work, timing)
}

#[test]
fn test_log_grows_monotonically_across_runs() {
    let project = TestProject::new("turbine", &["caseA"]);
    let log_path = project.path.join("timing.log");
    let engine = standard_engine(5);

    let mut sizes = Vec::new();
    for _ in 0..3 {
        let runner = RecordingRunner::new();
        let mut pipeline = file_pipeline(&project, &runner);
        engine
            .run(&TargetId::from("train"), &mut pipeline)
            .unwrap();
        sizes.push(std::fs::metadata(&log_path).unwrap().len());
    }

    assert!(sizes.windows(2).all(|w| w[0] < w[1]));
    let contents = std::fs::read_to_string(&log_path).unwrap();
    // features + train per run
    assert_eq!(contents.matches("revision: feedface Fixture\n\n").count(), 6);
}

#[test]
fn test_failed_run_leaves_previous_entries_intact() {
    let project = TestProject::new("turbine", &["caseA"]);
    let log_path = project.path.join("timing.log");
    let engine = standard_engine(5);

    let runner = RecordingRunner::new();
    let mut pipeline = file_pipeline(&project, &runner);
    engine.run(&TargetId::from("uniform"), &mut pipeline).unwrap();
    let before = std::fs::read_to_string(&log_path).unwrap();

    let failing = RecordingRunner::failing_at(1);
    let mut pipeline = file_pipeline(&project, &failing);
    assert!(engine.run(&TargetId::from("uniform"), &mut pipeline).is_err());

    let after = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(before, after);
    assert!(after.starts_with("uniform: "));
}

/// Config whose every tool is the no-op `true` command.
fn no_op_config() -> Config {
    let mut config = Config {
        model: "turbine".to_string(),
        num_training_cases: 1,
        ..Config::default()
    };
    for tool in Tool::ALL {
        config
            .tools
            .insert(tool.name().to_string(), vec!["true".to_string()]);
    }
    config
}

#[cfg(unix)]
#[test]
fn test_app_stamps_git_revision() {
    let project = TestProject::new("turbine", &["caseA"]);
    project.init_git("Add turbine experiment");

    let mut app = App::new(&no_op_config(), &project.path, false).unwrap();
    app.run(&[TargetId::from("plot_convergence")]).unwrap();

    let contents = std::fs::read_to_string(project.path.join("timing.log")).unwrap();
    for phase in ["uniform", "go", "ml", "plot_convergence"] {
        assert!(contents.contains(&format!("{}: ", phase)));
    }
    assert_eq!(contents.matches("Add turbine experiment").count(), 4);
}

#[test]
fn test_dry_run_leaves_timing_log_absent() {
    let project = TestProject::new("turbine", &["caseA"]);
    project.init_git("Add turbine experiment");

    let mut app = App::new(&no_op_config(), &project.path, true).unwrap();
    app.run(&[TargetId::from("uniform"), TargetId::from("train")])
        .unwrap();

    assert!(!project.path.join("timing.log").exists());
}
