//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Temporary project directories with a testing manifest
//! - Pipelines wired to a recording step runner and an in-memory timing log
//! - Temporary git repositories for revision stamps

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use meshflow::git::{FixedRevision, Revision};
use meshflow::layout::OutputLayout;
use meshflow::params::{self, ParameterSet};
use meshflow::step::RecordingRunner;
use meshflow::timing::{MemoryLogSink, TimingLogger};
use meshflow::workflow::{Pipeline, Workspace};

/// A temporary experiment project.
pub struct TestProject {
    /// Keeps the directory alive for the test's duration.
    pub temp_dir: TempDir,
    pub path: PathBuf,
}

impl TestProject {
    /// Project for `model` whose manifest lists `testing_cases`.
    pub fn new(model: &str, testing_cases: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().to_path_buf();
        let model_dir = path.join(model);
        std::fs::create_dir_all(&model_dir).expect("Failed to create model dir");
        let mut manifest = testing_cases.join("\n");
        if !manifest.is_empty() {
            manifest.push('\n');
        }
        std::fs::write(model_dir.join("testing_cases.txt"), manifest)
            .expect("Failed to write manifest");
        Self { temp_dir, path }
    }

    pub fn manifest(&self, model: &str) -> PathBuf {
        self.path.join(model).join("testing_cases.txt")
    }

    pub fn params(&self, model: &str, training: i64, approaches: &[&str]) -> ParameterSet {
        let approaches: Vec<String> = approaches.iter().map(|a| a.to_string()).collect();
        params::resolve(model, training, &self.manifest(model), &approaches, "")
            .expect("Failed to resolve parameters")
    }

    /// Initialise a git repository with a single commit.
    pub fn init_git(&self, message: &str) {
        for args in [
            vec!["init"],
            vec!["config", "user.email", "test@test.com"],
            vec!["config", "user.name", "Test User"],
            vec!["add", "."],
            vec!["commit", "--allow-empty", "-m", message],
        ] {
            let status = Command::new("git")
                .args(&args)
                .current_dir(&self.path)
                .status()
                .expect("Failed to run git");
            assert!(status.success(), "git {:?} failed", args);
        }
    }
}

/// A pipeline plus handles to inspect what it did.
pub struct Harness {
    pub pipeline: Pipeline,
    pub runner: RecordingRunner,
    pub log: MemoryLogSink,
}

impl Harness {
    pub fn new(params: ParameterSet, output_root: &Path) -> Self {
        Self::with_runner(params, output_root, RecordingRunner::new())
    }

    pub fn with_runner(params: ParameterSet, output_root: &Path, runner: RecordingRunner) -> Self {
        let log = MemoryLogSink::new();
        let timing = TimingLogger::new(
            Box::new(log.clone()),
            Box::new(FixedRevision(Revision {
                commit: "0123abcd".to_string(),
                summary: "Fixture revision".to_string(),
            })),
        );
        let work = Workspace::new(
            params,
            OutputLayout::new(output_root),
            Box::new(runner.clone()),
        );
        Self {
            pipeline: Pipeline::new(work, timing),
            runner,
            log,
        }
    }

    /// Labels of the timing blocks, in the order they were written.
    pub fn phase_labels(&self) -> Vec<String> {
        self.log
            .blocks()
            .iter()
            .filter_map(|block| block.split(':').next().map(String::from))
            .collect()
    }

    /// `case/approach` of each recorded step.
    pub fn step_items(&self) -> Vec<String> {
        self.runner
            .steps()
            .iter()
            .map(|step| match (&step.case, &step.approach) {
                (Some(case), Some(approach)) => format!("{}/{}", case, approach),
                (Some(case), None) => case.clone(),
                _ => "-".to_string(),
            })
            .collect()
    }
}

/// The turbine scenario: three training cases, two testing cases.
pub fn turbine(approaches: &[&str]) -> (TestProject, Harness) {
    let project = TestProject::new("turbine", &["caseA", "caseB"]);
    let params = project.params("turbine", 3, approaches);
    let harness = Harness::new(params, &project.path);
    (project, harness)
}
