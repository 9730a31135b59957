//! Phase runner: sequential fan-out over the case × approach cross-product.
//!
//! Ordering contract, relied on by the experiment scripts and the tests:
//! cases are the outer loop, in `CaseSelection` order (training ascending,
//! then testing in manifest order); approaches are the inner loop, in
//! configured order. Approach-independent phases visit each case once with
//! no approach. Items run one at a time and the first failure ends the
//! phase.

use serde::Serialize;

use crate::params::{CaseId, CaseSelection, ParameterSet};
use crate::{mlog_error, mlog_trace, Result};

/// Whether a phase's external step depends on the approach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseScope {
    PerCase,
    PerApproach,
}

/// The unit of one external invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    pub case: CaseId,
    pub approach: Option<String>,
}

impl std::fmt::Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.approach {
            Some(approach) => write!(f, "{}/{}", self.case, approach),
            None => write!(f, "{}", self.case),
        }
    }
}

/// Expand a phase into its work items, in execution order.
pub fn work_items(params: &ParameterSet, selection: CaseSelection, scope: PhaseScope) -> Vec<WorkItem> {
    let cases = params.cases(selection);
    match scope {
        PhaseScope::PerCase => cases
            .into_iter()
            .map(|case| WorkItem {
                case,
                approach: None,
            })
            .collect(),
        PhaseScope::PerApproach => cases
            .into_iter()
            .flat_map(|case| {
                params.approaches.iter().map(move |approach| WorkItem {
                    case: case.clone(),
                    approach: Some(approach.clone()),
                })
            })
            .collect(),
    }
}

/// Drives `f` over the items of one phase.
pub struct PhaseRunner<'a> {
    label: &'a str,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(label: &'a str) -> Self {
        Self { label }
    }

    pub fn run<F>(&self, items: &[WorkItem], mut f: F) -> Result<()>
    where
        F: FnMut(&WorkItem) -> Result<()>,
    {
        for (n, item) in items.iter().enumerate() {
            mlog_trace!("{} [{}/{}] {}", self.label, n + 1, items.len(), item);
            if let Err(e) = f(item) {
                mlog_error!("{} aborted at {}: {}", self.label, item, e);
                return Err(e);
            }
        }
        Ok(())
    }
}
