use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use meshflow::app::{resolve_params, App};
use meshflow::config::{Config, Overrides, CONFIG_FILE};
use meshflow::core::{Target, TargetId, DEFAULT_REPETITIONS};
use meshflow::workflow::standard_engine;
use meshflow::{mlog, Result};

/// meshflow - run goal-oriented vs data-driven mesh adaptation experiments
#[derive(Parser, Debug)]
#[command(name = "meshflow")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    MESHFLOW_DEBUG=1     Enable debug logging (alternative to --debug)\n    MESHFLOW_DEBUG=trace Also log every work item")]
pub struct Cli {
    /// Configuration file; its directory is the project root
    #[arg(short = 'c', long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Enable debug logging (writes to ~/.meshflow/meshflow.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Experiment model (selects the model directory)
    #[arg(long)]
    pub model: Option<String>,

    /// Number of generated training cases (1..=N)
    #[arg(long)]
    pub num_training_cases: Option<i64>,

    /// Adaptation approaches, comma separated, in run order
    #[arg(long, value_delimiter = ',')]
    pub approaches: Option<Vec<String>>,

    /// Options passed through to every solver step
    #[arg(long, allow_hyphen_values = true)]
    pub solver_options: Option<String>,

    /// Testing-case manifest (one case per line)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Print external commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run targets and their dependencies (default: all)
    Run {
        /// Targets to run, in order
        targets: Vec<String>,
    },

    /// Run a target's full closure several times for profiling
    Repeat {
        target: String,

        #[arg(long, short = 'n', default_value_t = DEFAULT_REPETITIONS)]
        count: usize,
    },

    /// List targets and their dependencies
    List,

    /// Print the resolved cases and approaches as JSON
    Cases,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    meshflow::log::init_with_debug(cli.debug);
    mlog!("meshflow starting: {:?}", cli.command);

    let base_dir = project_root(&cli.config);
    let mut config = Config::load(&cli.config)?;
    config.apply(Overrides {
        model: cli.model,
        num_training_cases: cli.num_training_cases,
        approaches: cli.approaches,
        solver_options: cli.solver_options,
        manifest: cli.manifest,
    });

    match cli.command {
        Command::Run { targets } => {
            let targets: Vec<TargetId> = if targets.is_empty() {
                vec![TargetId::from("all")]
            } else {
                targets.into_iter().map(TargetId::from).collect()
            };
            let mut app = App::new(&config, &base_dir, cli.dry_run)?;
            if cli.dry_run {
                for (target, closure) in targets.iter().zip(app.plan(&targets)?) {
                    println!("# {}: {}", target, join_ids(&closure));
                }
            }
            for summary in app.run(&targets)? {
                println!(
                    "{}: {} targets in {:.1}s",
                    summary.target,
                    summary.executed.len(),
                    (summary.finished_at - summary.started_at).num_milliseconds() as f64 / 1000.0
                );
            }
            Ok(())
        }
        Command::Repeat { target, count } => {
            let mut app = App::new(&config, &base_dir, cli.dry_run)?;
            let target_id = TargetId::from(target.as_str());
            if cli.dry_run {
                let closure = app.engine.closure(&target_id)?;
                println!("# {} x{}: {}", target, count, join_ids(&closure));
            }
            let samples = app.repeat(&target_id, count)?;
            println!("{}: {} repetitions completed", target, samples.len());
            Ok(())
        }
        Command::List => {
            let engine = standard_engine(config.profile.repetitions);
            for target in engine.targets() {
                println!("{:<18} {}", target.id, describe(target));
            }
            Ok(())
        }
        Command::Cases => {
            let params = resolve_params(&config, &base_dir)?;
            println!("{}", serde_json::to_string_pretty(&params)?);
            Ok(())
        }
    }
}

fn join_ids(ids: &[TargetId]) -> String {
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(" -> ")
}

/// Dependencies, then repeated targets, as one comma separated list.
fn describe<C>(target: &Target<C>) -> String {
    target
        .deps
        .iter()
        .map(|d| d.to_string())
        .chain(target.repeated_targets().map(|t| format!("repeat({})", t)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn project_root(config: &Path) -> PathBuf {
    match config.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
