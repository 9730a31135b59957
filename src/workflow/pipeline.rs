//! The standard experiment target graph.
//!
//! ```text
//! all ─┬─ setup
//!      ├─ network ── features, train, plot_progress, plot_importance
//!      ├─ convergence ── uniform, go, ml, plot_convergence
//!      ├─ profile ── repeat(profile_sample) ── profile_uniform, profile_go, profile_ml
//!      └─ snapshot ── snapshot_go, snapshot_ml (then plots)
//! ```

use crate::core::{Action, Engine};
use crate::workflow::phases::{self, Pipeline, Workspace};
use crate::Result;

/// Target that samples one profile of each refinement strategy.
pub const PROFILE_SAMPLE: &str = "profile_sample";

fn timed(label: &'static str, body: fn(&mut Workspace) -> Result<()>) -> Action<Pipeline> {
    Action::run(move |pipeline: &mut Pipeline| pipeline.phase(label, body))
}

/// Register every experiment target. `profile_repetitions` is how many
/// samples the `profile` target collects.
pub fn standard_engine(profile_repetitions: usize) -> Engine<Pipeline> {
    let mut engine = Engine::new();
    engine
        .register("all", &["setup", "network", "convergence", "profile", "snapshot"], vec![])
        .register("setup", &[], vec![timed("setup", phases::setup)])
        // Network: harvest features, train, then inspect the model.
        .register("features", &[], vec![timed("features", phases::features)])
        .register("train", &["features"], vec![timed("train", phases::train)])
        .register(
            "plot_progress",
            &["train"],
            vec![timed("plot_progress", phases::plot_progress)],
        )
        .register(
            "plot_importance",
            &["train"],
            vec![timed("plot_importance", phases::plot_importance)],
        )
        .register(
            "network",
            &["features", "train", "plot_progress", "plot_importance"],
            vec![],
        )
        // Convergence: all three strategies feed one summary plot.
        .register("uniform", &[], vec![timed("uniform", phases::uniform)])
        .register("go", &[], vec![timed("go", phases::go)])
        .register("ml", &[], vec![timed("ml", phases::ml)])
        .register(
            "plot_convergence",
            &["uniform", "go", "ml"],
            vec![timed("plot_convergence", phases::plot_convergence)],
        )
        .register(
            "convergence",
            &["uniform", "go", "ml", "plot_convergence"],
            vec![],
        )
        // Profiling
        .register(
            "profile_uniform",
            &[],
            vec![timed("profile_uniform", phases::profile_uniform)],
        )
        .register("profile_go", &[], vec![timed("profile_go", phases::profile_go)])
        .register("profile_ml", &[], vec![timed("profile_ml", phases::profile_ml)])
        .register(
            PROFILE_SAMPLE,
            &["profile_uniform", "profile_go", "profile_ml"],
            vec![],
        )
        .register(
            "profile",
            &[],
            vec![Action::repeat(PROFILE_SAMPLE, profile_repetitions)],
        )
        // Snapshots
        .register(
            "snapshot_go",
            &[],
            vec![timed("snapshot_go", phases::snapshot_go)],
        )
        .register(
            "snapshot_ml",
            &[],
            vec![timed("snapshot_ml", phases::snapshot_ml)],
        )
        .register(
            "snapshot",
            &["snapshot_go", "snapshot_ml"],
            vec![timed("snapshot", phases::plot_snapshots)],
        );
    engine
}
