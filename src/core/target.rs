//! Target data model for the task graph.
//!
//! A target is a named unit of work: an ordered list of dependencies
//! that must succeed first, followed by an ordered list of actions.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifier of a registered target (`"features"`, `"all"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TargetId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TargetId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a target within one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    #[default]
    NotStarted,
    Running,
    Succeeded,
    /// Failed itself, or aborted because a dependency failed.
    Failed,
}

impl std::fmt::Display for TargetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetState::NotStarted => write!(f, "not started"),
            TargetState::Running => write!(f, "running"),
            TargetState::Succeeded => write!(f, "succeeded"),
            TargetState::Failed => write!(f, "failed"),
        }
    }
}

/// Closure action over a caller-supplied context.
pub type ActionFn<C> = Box<dyn Fn(&mut C) -> Result<()>>;

/// One step of a target's action sequence.
pub enum Action<C> {
    /// Run a closure against the pipeline context.
    Run(ActionFn<C>),
    /// Re-run another target's full closure `count` times in process.
    Repeat { target: TargetId, count: usize },
}

impl<C> Action<C> {
    pub fn run<F>(f: F) -> Self
    where
        F: Fn(&mut C) -> Result<()> + 'static,
    {
        Action::Run(Box::new(f))
    }

    pub fn repeat(target: impl Into<TargetId>, count: usize) -> Self {
        Action::Repeat {
            target: target.into(),
            count,
        }
    }
}

impl<C> std::fmt::Debug for Action<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Run(_) => write!(f, "Run(..)"),
            Action::Repeat { target, count } => f
                .debug_struct("Repeat")
                .field("target", target)
                .field("count", count)
                .finish(),
        }
    }
}

/// A registered target.
pub struct Target<C> {
    pub id: TargetId,
    pub deps: Vec<TargetId>,
    pub actions: Vec<Action<C>>,
}

impl<C> Target<C> {
    pub fn new(id: impl Into<TargetId>, deps: Vec<TargetId>, actions: Vec<Action<C>>) -> Self {
        Self {
            id: id.into(),
            deps,
            actions,
        }
    }

    /// Targets re-entered through `Repeat` actions.
    pub fn repeated_targets(&self) -> impl Iterator<Item = &TargetId> {
        self.actions.iter().filter_map(|action| match action {
            Action::Repeat { target, .. } => Some(target),
            Action::Run(_) => None,
        })
    }

    /// Aggregate targets only order their dependencies.
    pub fn is_aggregate(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<C> std::fmt::Debug for Target<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("id", &self.id)
            .field("deps", &self.deps)
            .field("actions", &self.actions)
            .finish()
    }
}
