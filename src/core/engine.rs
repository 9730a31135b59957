//! Task graph engine.
//!
//! Targets are registered by name with their dependencies and actions.
//! `run` resolves the dependency closure of one target depth-first, in
//! declared dependency order, executing each target at most once per call.
//! The first failure aborts everything that has not started yet.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use uuid::Uuid;

use crate::core::repeat;
use crate::core::target::{Action, Target, TargetId, TargetState};
use crate::error::{Error, Result};
use crate::{mlog, mlog_debug, mlog_error};

/// Outcome of one successful `Engine::run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub target: TargetId,
    /// Targets in the order their actions completed.
    pub executed: Vec<TargetId>,
    /// Final state of every target this run visited.
    pub states: BTreeMap<TargetId, TargetState>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Per-run bookkeeping; discarded when the run ends.
#[derive(Default)]
struct RunState {
    states: BTreeMap<TargetId, TargetState>,
    executed: Vec<TargetId>,
}

impl RunState {
    fn state(&self, id: &TargetId) -> TargetState {
        self.states.get(id).copied().unwrap_or_default()
    }

    fn set(&mut self, id: &TargetId, state: TargetState) {
        self.states.insert(id.clone(), state);
    }
}

/// The target registry and executor, generic over the context handed to
/// every action.
pub struct Engine<C> {
    targets: Vec<Target<C>>,
    index: HashMap<TargetId, usize>,
}

impl<C> Engine<C> {
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a target. Dependencies may name targets registered later;
    /// they are checked when the engine runs. Registering an existing id
    /// replaces its definition.
    pub fn register(
        &mut self,
        id: impl Into<TargetId>,
        deps: &[&str],
        actions: Vec<Action<C>>,
    ) -> &mut Self {
        let deps = deps.iter().map(|d| TargetId::from(*d)).collect();
        self.insert(Target::new(id, deps, actions))
    }

    pub fn insert(&mut self, target: Target<C>) -> &mut Self {
        match self.index.get(&target.id) {
            Some(&slot) => self.targets[slot] = target,
            None => {
                self.index.insert(target.id.clone(), self.targets.len());
                self.targets.push(target);
            }
        }
        self
    }

    pub fn get(&self, id: &TargetId) -> Option<&Target<C>> {
        self.index.get(id).map(|&slot| &self.targets[slot])
    }

    pub fn contains(&self, id: &TargetId) -> bool {
        self.index.contains_key(id)
    }

    /// Registered targets in registration order.
    pub fn targets(&self) -> impl Iterator<Item = &Target<C>> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Check that every referenced target exists and that dependency and
    /// repeat edges form no cycle.
    pub fn validate(&self) -> Result<()> {
        let mut graph: DiGraph<&TargetId, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = self.targets.iter().map(|t| graph.add_node(&t.id)).collect();

        for (slot, target) in self.targets.iter().enumerate() {
            for required in target.deps.iter().chain(target.repeated_targets()) {
                let Some(&dep_slot) = self.index.get(required) else {
                    return Err(Error::Configuration(format!(
                        "Target '{}' depends on unknown target '{}'",
                        target.id, required
                    )));
                };
                graph.add_edge(nodes[dep_slot], nodes[slot], ());
            }
        }

        if is_cyclic_directed(&graph) {
            let name = toposort(&graph, None)
                .err()
                .and_then(|cycle| graph.node_weight(cycle.node_id()).map(|id| id.to_string()))
                .unwrap_or_else(|| "unknown".to_string());
            return Err(Error::Configuration(format!(
                "Dependency cycle detected at target: {}",
                name
            )));
        }
        Ok(())
    }

    /// Dependency closure of `id` in execution order, without running it.
    pub fn closure(&self, id: &TargetId) -> Result<Vec<TargetId>> {
        self.require(id)?;
        self.validate()?;
        let mut order = Vec::new();
        self.collect_closure(id, &mut order);
        Ok(order)
    }

    fn collect_closure(&self, id: &TargetId, order: &mut Vec<TargetId>) {
        if order.contains(id) {
            return;
        }
        if let Some(target) = self.get(id) {
            for dep in &target.deps {
                self.collect_closure(dep, order);
            }
        }
        order.push(id.clone());
    }

    fn require(&self, id: &TargetId) -> Result<&Target<C>> {
        self.get(id)
            .ok_or_else(|| Error::Configuration(format!("Unknown target: {}", id)))
    }

    /// Execute `id` after its full dependency closure.
    ///
    /// Memoisation lives for this call only; calling `run` again executes
    /// every target in the closure again.
    pub fn run(&self, id: &TargetId, ctx: &mut C) -> Result<RunSummary> {
        self.require(id)?;
        self.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        mlog!("Run {} of target '{}' started", run_id, id);

        let mut state = RunState::default();
        if let Err(e) = self.execute(id, ctx, &mut state) {
            mlog_error!("Run {} of target '{}' failed: {}", run_id, id, e);
            return Err(e);
        }

        mlog!(
            "Run {} of target '{}' succeeded ({} targets)",
            run_id,
            id,
            state.executed.len()
        );
        Ok(RunSummary {
            run_id,
            target: id.clone(),
            executed: state.executed,
            states: state.states,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn execute(&self, id: &TargetId, ctx: &mut C, state: &mut RunState) -> Result<()> {
        match state.state(id) {
            TargetState::Succeeded => return Ok(()),
            // validate() rules out cycles and fail-fast never revisits a
            // failed target, so neither should be reachable.
            TargetState::Running | TargetState::Failed => {
                return Err(Error::Configuration(format!(
                    "Target '{}' re-entered while {}",
                    id,
                    state.state(id)
                )));
            }
            TargetState::NotStarted => {}
        }

        let target = self.require(id)?;
        state.set(id, TargetState::Running);

        for dep in &target.deps {
            if let Err(e) = self.execute(dep, ctx, state) {
                state.set(id, TargetState::Failed);
                return Err(dependency_failure(id, dep, e));
            }
        }

        mlog_debug!("Target '{}': running {} action(s)", id, target.actions.len());
        for action in &target.actions {
            let result = match action {
                Action::Run(f) => f(ctx),
                Action::Repeat { target, count } => {
                    repeat::repeat(self, target, *count, ctx).map(|_| ())
                }
            };
            if let Err(e) = result {
                state.set(id, TargetState::Failed);
                return Err(e);
            }
        }

        state.set(id, TargetState::Succeeded);
        state.executed.push(id.clone());
        Ok(())
    }
}

impl<C> Default for Engine<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("targets", &self.targets.len())
            .finish()
    }
}

/// Wrap a dependency's own failure once; failures that already name their
/// origin pass through unchanged.
fn dependency_failure(target: &TargetId, dependency: &TargetId, err: Error) -> Error {
    match err {
        Error::DependencyFailure { .. } => err,
        other => Error::DependencyFailure {
            target: target.clone(),
            dependency: dependency.clone(),
            source: Box::new(other),
        },
    }
}
