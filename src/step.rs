//! External step invocation.
//!
//! Mesh generation, solving, training, importance computation and plotting
//! are opaque commands. Each invocation blocks until the command exits; a
//! non-zero exit aborts the run.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;

use serde::Serialize;

use crate::params::CaseId;
use crate::{mlog_debug, mlog_error, mlog_trace, Error, Result};

/// External collaborators the pipeline knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    MeshGen,
    /// Goal-oriented fixed-point adaptation; harvests feature data.
    AdaptGo,
    /// Data-driven adaptation using the trained model.
    AdaptMl,
    Uniform,
    ConvergenceGo,
    ConvergenceMl,
    Train,
    Importance,
    PlotConfig,
    PlotProgress,
    PlotImportance,
    PlotConvergence,
    PlotSnapshots,
}

impl Tool {
    pub const ALL: [Tool; 13] = [
        Tool::MeshGen,
        Tool::AdaptGo,
        Tool::AdaptMl,
        Tool::Uniform,
        Tool::ConvergenceGo,
        Tool::ConvergenceMl,
        Tool::Train,
        Tool::Importance,
        Tool::PlotConfig,
        Tool::PlotProgress,
        Tool::PlotImportance,
        Tool::PlotConvergence,
        Tool::PlotSnapshots,
    ];

    /// Key used in the `[tools]` config table.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::MeshGen => "meshgen",
            Tool::AdaptGo => "adapt_go",
            Tool::AdaptMl => "adapt_ml",
            Tool::Uniform => "uniform",
            Tool::ConvergenceGo => "convergence_go",
            Tool::ConvergenceMl => "convergence_ml",
            Tool::Train => "train",
            Tool::Importance => "importance",
            Tool::PlotConfig => "plot_config",
            Tool::PlotProgress => "plot_progress",
            Tool::PlotImportance => "plot_importance",
            Tool::PlotConvergence => "plot_convergence",
            Tool::PlotSnapshots => "plot_snapshots",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn default_command(&self) -> Vec<String> {
        let script = match self {
            Tool::MeshGen => "meshgen.py",
            Tool::AdaptGo => "run_adapt.py",
            Tool::AdaptMl => "run_adapt_ml.py",
            Tool::Uniform => "run_uniform_refinement.py",
            Tool::ConvergenceGo => "run_adaptation_loop.py",
            Tool::ConvergenceMl => "run_adaptation_loop_ml.py",
            Tool::Train => "test_and_train.py",
            Tool::Importance => "compute_importance.py",
            Tool::PlotConfig => "plot_config.py",
            Tool::PlotProgress => "plot_progress.py",
            Tool::PlotImportance => "plot_importance.py",
            Tool::PlotConvergence => "plot_convergence.py",
            Tool::PlotSnapshots => "plot_snapshots.py",
        };
        vec!["python3".to_string(), script.to_string()]
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One blocking external invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub tool: Tool,
    pub model: String,
    pub case: Option<CaseId>,
    pub approach: Option<String>,
    pub solver_options: String,
}

impl Step {
    pub fn new(tool: Tool, model: &str, solver_options: &str) -> Self {
        Self {
            tool,
            model: model.to_string(),
            case: None,
            approach: None,
            solver_options: solver_options.to_string(),
        }
    }

    pub fn case(mut self, case: &str) -> Self {
        self.case = Some(case.to_string());
        self
    }

    pub fn approach(mut self, approach: Option<&str>) -> Self {
        self.approach = approach.map(String::from);
        self
    }

    /// Arguments following the tool's own command.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.model.clone()];
        if let Some(case) = &self.case {
            args.push(case.clone());
        }
        if let Some(approach) = &self.approach {
            args.push("-approach".to_string());
            args.push(approach.clone());
        }
        args.extend(self.solver_options.split_whitespace().map(String::from));
        args
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.tool, self.args().join(" "))
    }
}

/// Executes steps. Implementations must block until the step finishes.
pub trait StepRunner {
    fn invoke(&mut self, step: &Step) -> Result<()>;
}

/// Runs steps as child processes from the project directory, with the
/// child's output passed straight through.
pub struct CommandRunner {
    base_dir: PathBuf,
    commands: BTreeMap<Tool, Vec<String>>,
}

impl CommandRunner {
    pub fn new(base_dir: &Path, commands: BTreeMap<Tool, Vec<String>>) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            commands,
        }
    }

    pub fn command_line(&self, step: &Step) -> Vec<String> {
        let mut line = self
            .commands
            .get(&step.tool)
            .cloned()
            .unwrap_or_else(|| step.tool.default_command());
        line.extend(step.args());
        line
    }
}

impl StepRunner for CommandRunner {
    fn invoke(&mut self, step: &Step) -> Result<()> {
        let line = self.command_line(step);
        let failure = |reason: String| Error::ExternalStepFailure {
            step: line.join(" "),
            reason,
        };
        let Some((program, args)) = line.split_first() else {
            return Err(failure("empty command".to_string()));
        };

        let resolved = which::which_in(program, std::env::var_os("PATH"), &self.base_dir)
            .map_err(|e| failure(format!("cannot find '{}': {}", program, e)))?;
        mlog_debug!("Invoking: {} {}", resolved.display(), args.join(" "));

        let status = Command::new(&resolved)
            .args(args)
            .current_dir(&self.base_dir)
            .status()
            .map_err(|e| failure(e.to_string()))?;

        if !status.success() {
            mlog_error!("Step failed ({}): {}", status, line.join(" "));
            return Err(failure(status.to_string()));
        }
        Ok(())
    }
}

/// Prints each command line instead of running it.
pub struct DryRunner {
    inner: CommandRunner,
}

impl DryRunner {
    pub fn new(inner: CommandRunner) -> Self {
        Self { inner }
    }
}

impl StepRunner for DryRunner {
    fn invoke(&mut self, step: &Step) -> Result<()> {
        let line = self.inner.command_line(step).join(" ");
        mlog_trace!("Dry run: {}", line);
        println!("{}", line);
        Ok(())
    }
}

/// Records steps in memory; clones share the record. Optionally fails the
/// n-th invocation (1-indexed) to exercise abort paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    steps: Rc<RefCell<Vec<Step>>>,
    fail_at: Option<usize>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(n: usize) -> Self {
        Self {
            fail_at: Some(n),
            ..Self::default()
        }
    }

    pub fn steps(&self) -> Vec<Step> {
        self.steps.borrow().clone()
    }

    pub fn count(&self, tool: Tool) -> usize {
        self.steps.borrow().iter().filter(|s| s.tool == tool).count()
    }
}

impl StepRunner for RecordingRunner {
    fn invoke(&mut self, step: &Step) -> Result<()> {
        let n = {
            let mut steps = self.steps.borrow_mut();
            steps.push(step.clone());
            steps.len()
        };
        if self.fail_at == Some(n) {
            return Err(Error::ExternalStepFailure {
                step: step.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}
