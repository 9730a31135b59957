pub mod app;
pub mod config;
pub mod error;
pub mod git;
pub mod layout;
pub mod log;
pub mod params;
pub mod step;
pub mod timing;

// Task graph and experiment workflow
pub mod core;
pub mod workflow;

pub use error::{Error, Result};
pub use params::{CaseId, CaseSelection, ParameterSet};
