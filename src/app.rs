//! Wiring from configuration to a runnable engine and pipeline context.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::core::{repeat, Engine, RunSummary, TargetId};
use crate::git::GitRevision;
use crate::layout::OutputLayout;
use crate::params::{self, ParameterSet};
use crate::step::{CommandRunner, DryRunner, StepRunner, Tool};
use crate::timing::{FileLogSink, LogSink, MemoryLogSink, TimingLogger};
use crate::workflow::{standard_engine, Pipeline, Workspace};
use crate::{mlog, Result};

pub struct App {
    pub engine: Engine<Pipeline>,
    pub pipeline: Pipeline,
}

impl App {
    /// Resolve parameters once and assemble the engine.
    ///
    /// Relative paths in `config` are taken from `base_dir`, which is also
    /// where external steps run.
    pub fn new(config: &Config, base_dir: &Path, dry_run: bool) -> Result<Self> {
        config.validate()?;
        let params = resolve_params(config, base_dir)?;

        let commands: BTreeMap<Tool, Vec<String>> = Tool::ALL
            .into_iter()
            .map(|tool| (tool, config.command_for(tool)))
            .collect();
        let runner = CommandRunner::new(base_dir, commands);
        let steps: Box<dyn StepRunner> = if dry_run {
            Box::new(DryRunner::new(runner))
        } else {
            Box::new(runner)
        };

        let mut work = Workspace::new(params, OutputLayout::new(config.output_root(base_dir)), steps);
        work.profile_options = config.profile.options.clone();
        work.snapshot_options = config.snapshot.options.clone();

        // Nothing runs in a dry run, so nothing may reach the timing log.
        let sink: Box<dyn LogSink> = if dry_run {
            Box::new(MemoryLogSink::new())
        } else {
            let timing_log: PathBuf = config.timing_log_path(base_dir);
            Box::new(FileLogSink::new(&timing_log))
        };
        let timing = TimingLogger::new(sink, Box::new(GitRevision::new(base_dir)));

        Ok(Self {
            engine: standard_engine(config.profile.repetitions),
            pipeline: Pipeline::new(work, timing),
        })
    }

    pub fn params(&self) -> &ParameterSet {
        &self.pipeline.work.params
    }

    /// Dependency closure of each target in execution order, without
    /// running anything.
    pub fn plan(&self, targets: &[TargetId]) -> Result<Vec<Vec<TargetId>>> {
        targets.iter().map(|t| self.engine.closure(t)).collect()
    }

    /// Run each target in turn; the first failure stops the rest.
    pub fn run(&mut self, targets: &[TargetId]) -> Result<Vec<RunSummary>> {
        let mut summaries = Vec::with_capacity(targets.len());
        for target in targets {
            summaries.push(self.engine.run(target, &mut self.pipeline)?);
        }
        mlog!("Completed targets: {:?}", targets);
        Ok(summaries)
    }

    pub fn repeat(&mut self, target: &TargetId, count: usize) -> Result<Vec<RunSummary>> {
        repeat(&self.engine, target, count, &mut self.pipeline)
    }
}

pub fn resolve_params(config: &Config, base_dir: &Path) -> Result<ParameterSet> {
    params::resolve(
        &config.model,
        config.num_training_cases,
        &config.manifest_path(base_dir),
        &config.approaches,
        &config.solver_options,
    )
}
