//! Dependency-driven execution core.
//!
//! Targets, the engine that runs their dependency closures, and the
//! repetition controller used for profiling.

pub mod engine;
pub mod repeat;
pub mod target;

pub use engine::{Engine, RunSummary};
pub use repeat::{repeat, DEFAULT_REPETITIONS};
pub use target::{Action, Target, TargetId, TargetState};
