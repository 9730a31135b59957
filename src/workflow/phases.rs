//! Experiment phases.
//!
//! Each phase provisions its case directories, then hands its work items to
//! the phase runner, one external step per item.

use crate::layout::OutputLayout;
use crate::params::{CaseSelection, ParameterSet};
use crate::step::{Step, StepRunner, Tool};
use crate::timing::TimingLogger;
use crate::workflow::runner::{work_items, PhaseRunner, PhaseScope};
use crate::Result;

/// Everything a phase needs besides the timing log.
pub struct Workspace {
    pub params: ParameterSet,
    pub layout: OutputLayout,
    pub steps: Box<dyn StepRunner>,
    /// Extra solver options for profiling runs.
    pub profile_options: String,
    /// Extra solver options for snapshot runs.
    pub snapshot_options: String,
}

impl Workspace {
    pub fn new(params: ParameterSet, layout: OutputLayout, steps: Box<dyn StepRunner>) -> Self {
        Self {
            params,
            layout,
            steps,
            profile_options: String::new(),
            snapshot_options: String::new(),
        }
    }

    fn options_with(&self, extra: &str) -> String {
        format!("{} {}", self.params.solver_options, extra)
            .trim()
            .to_string()
    }

    /// One step per work item of `selection`, in runner order.
    fn fan_out(
        &mut self,
        label: &str,
        tool: Tool,
        selection: CaseSelection,
        scope: PhaseScope,
        extra_options: &str,
    ) -> Result<()> {
        let options = self.options_with(extra_options);
        let Workspace {
            params,
            layout,
            steps,
            ..
        } = self;

        layout.ensure_case_dirs(&params.model, &params.cases(selection))?;
        let items = work_items(params, selection, scope);
        PhaseRunner::new(label).run(&items, |item| {
            let step = Step::new(tool, &params.model, &options)
                .case(&item.case)
                .approach(item.approach.as_deref());
            steps.invoke(&step)
        })
    }

    /// A single model-level step, e.g. training or a plot.
    fn once(&mut self, tool: Tool) -> Result<()> {
        let step = Step::new(tool, &self.params.model, &self.params.solver_options);
        self.steps.invoke(&step)
    }
}

/// The context every target action receives.
pub struct Pipeline {
    pub timing: TimingLogger,
    pub work: Workspace,
}

impl Pipeline {
    pub fn new(work: Workspace, timing: TimingLogger) -> Self {
        Self { timing, work }
    }

    /// Run `body` as a phase; a timing block is written only on success.
    pub fn phase<F>(&mut self, label: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut Workspace) -> Result<()>,
    {
        let Pipeline { timing, work } = self;
        timing.with_timing(label, || body(work))
    }
}

pub fn setup(work: &mut Workspace) -> Result<()> {
    work.layout.ensure_data_dir(&work.params.model)?;
    work.fan_out("setup", Tool::MeshGen, CaseSelection::All, PhaseScope::PerCase, "")?;
    work.once(Tool::PlotConfig)
}

/// Goal-oriented runs on the training cases; these write the feature data.
pub fn features(work: &mut Workspace) -> Result<()> {
    work.fan_out(
        "features",
        Tool::AdaptGo,
        CaseSelection::Training,
        PhaseScope::PerApproach,
        "",
    )
}

pub fn train(work: &mut Workspace) -> Result<()> {
    work.once(Tool::Train)
}

pub fn plot_progress(work: &mut Workspace) -> Result<()> {
    work.once(Tool::PlotProgress)
}

pub fn plot_importance(work: &mut Workspace) -> Result<()> {
    work.fan_out(
        "plot_importance",
        Tool::Importance,
        CaseSelection::Testing,
        PhaseScope::PerApproach,
        "",
    )?;
    work.once(Tool::PlotImportance)
}

pub fn uniform(work: &mut Workspace) -> Result<()> {
    work.fan_out("uniform", Tool::Uniform, CaseSelection::Testing, PhaseScope::PerCase, "")
}

pub fn go(work: &mut Workspace) -> Result<()> {
    work.fan_out(
        "go",
        Tool::ConvergenceGo,
        CaseSelection::Testing,
        PhaseScope::PerApproach,
        "",
    )
}

pub fn ml(work: &mut Workspace) -> Result<()> {
    work.fan_out(
        "ml",
        Tool::ConvergenceMl,
        CaseSelection::Testing,
        PhaseScope::PerApproach,
        "",
    )
}

pub fn plot_convergence(work: &mut Workspace) -> Result<()> {
    work.once(Tool::PlotConvergence)
}

pub fn profile_uniform(work: &mut Workspace) -> Result<()> {
    let extra = work.profile_options.clone();
    work.fan_out(
        "profile_uniform",
        Tool::Uniform,
        CaseSelection::Testing,
        PhaseScope::PerCase,
        &extra,
    )
}

pub fn profile_go(work: &mut Workspace) -> Result<()> {
    let extra = work.profile_options.clone();
    work.fan_out(
        "profile_go",
        Tool::ConvergenceGo,
        CaseSelection::Testing,
        PhaseScope::PerApproach,
        &extra,
    )
}

pub fn profile_ml(work: &mut Workspace) -> Result<()> {
    let extra = work.profile_options.clone();
    work.fan_out(
        "profile_ml",
        Tool::ConvergenceMl,
        CaseSelection::Testing,
        PhaseScope::PerApproach,
        &extra,
    )
}

pub fn snapshot_go(work: &mut Workspace) -> Result<()> {
    let extra = work.snapshot_options.clone();
    work.fan_out(
        "snapshot_go",
        Tool::AdaptGo,
        CaseSelection::Testing,
        PhaseScope::PerApproach,
        &extra,
    )
}

pub fn snapshot_ml(work: &mut Workspace) -> Result<()> {
    let extra = work.snapshot_options.clone();
    work.fan_out(
        "snapshot_ml",
        Tool::AdaptMl,
        CaseSelection::Testing,
        PhaseScope::PerApproach,
        &extra,
    )
}

pub fn plot_snapshots(work: &mut Workspace) -> Result<()> {
    work.once(Tool::PlotSnapshots)
}
