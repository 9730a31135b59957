//! Experiment workflow: the phase runner, the phases themselves and the
//! standard target graph that sequences them.

pub mod phases;
pub mod pipeline;
pub mod runner;

pub use phases::{Pipeline, Workspace};
pub use pipeline::{standard_engine, PROFILE_SAMPLE};
pub use runner::{work_items, PhaseRunner, PhaseScope, WorkItem};
