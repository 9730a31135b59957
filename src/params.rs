//! Parameter resolution: configuration to concrete case and approach lists.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{mlog_debug, mlog_warn, Error, Result};

/// Opaque case identifier. Training cases are `"1"..="N"`, testing cases
/// are whatever the manifest lists.
pub type CaseId = String;

/// Which slice of the case list a phase iterates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSelection {
    Training,
    Testing,
    /// Training cases ascending, then testing cases in manifest order.
    All,
}

/// Resolved configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSet {
    pub model: String,
    pub training_cases: Vec<CaseId>,
    pub testing_cases: Vec<CaseId>,
    pub approaches: Vec<String>,
    pub solver_options: String,
}

impl ParameterSet {
    pub fn cases(&self, selection: CaseSelection) -> Vec<CaseId> {
        match selection {
            CaseSelection::Training => self.training_cases.clone(),
            CaseSelection::Testing => self.testing_cases.clone(),
            CaseSelection::All => self.all_cases(),
        }
    }

    /// Combined list. Ids present in both sets appear twice.
    pub fn all_cases(&self) -> Vec<CaseId> {
        self.training_cases
            .iter()
            .chain(self.testing_cases.iter())
            .cloned()
            .collect()
    }

    /// Ids listed both as training and testing cases.
    pub fn overlapping_cases(&self) -> Vec<&CaseId> {
        self.testing_cases
            .iter()
            .filter(|case| self.training_cases.contains(case))
            .collect()
    }
}

/// Model identifiers name a directory under the project root.
static MODEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Case identifiers become one path component under `<model>/outputs`.
static CASE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^/\\]+$").unwrap());

fn check_case_id(id: &str, line: usize, path: &Path) -> Result<()> {
    if !CASE_RE.is_match(id) || id == "." || id == ".." {
        return Err(Error::Configuration(format!(
            "Invalid case identifier '{}' at {}:{}",
            id,
            path.display(),
            line
        )));
    }
    Ok(())
}

/// Build a `ParameterSet` from configuration values and the testing manifest.
pub fn resolve(
    model: &str,
    training_count: i64,
    manifest_path: &Path,
    approaches: &[String],
    solver_options: &str,
) -> Result<ParameterSet> {
    mlog_debug!(
        "params::resolve model={} training_count={} manifest={} approaches={:?}",
        model,
        training_count,
        manifest_path.display(),
        approaches
    );

    if !MODEL_RE.is_match(model) {
        return Err(Error::Configuration(format!(
            "Invalid model identifier '{}'",
            model
        )));
    }
    if training_count <= 0 {
        return Err(Error::Configuration(format!(
            "Training case count must be positive, got {}",
            training_count
        )));
    }
    if approaches.is_empty() {
        return Err(Error::Configuration(
            "At least one approach is required".to_string(),
        ));
    }

    let training_cases = (1..=training_count).map(|n| n.to_string()).collect();
    let testing_cases = read_manifest(manifest_path)?;

    let params = ParameterSet {
        model: model.to_string(),
        training_cases,
        testing_cases,
        approaches: approaches.to_vec(),
        solver_options: solver_options.to_string(),
    };

    if params.all_cases().is_empty() {
        return Err(Error::Configuration(format!(
            "No cases resolved for model '{}'",
            model
        )));
    }
    for case in params.overlapping_cases() {
        mlog_warn!(
            "Case '{}' is both a training and a testing case; it will be processed twice",
            case
        );
    }
    Ok(params)
}

/// One identifier per line, in file order. Blank lines are skipped; ids
/// that are not a plain directory name are rejected.
pub fn read_manifest(path: &Path) -> Result<Vec<CaseId>> {
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::Configuration(format!(
            "Cannot read testing manifest {}: {}",
            path.display(),
            e
        ))
    })?;
    let mut cases = Vec::new();
    for (n, line) in contents.lines().enumerate() {
        let id = line.trim();
        if id.is_empty() {
            continue;
        }
        check_case_id(id, n + 1, path)?;
        cases.push(id.to_string());
    }
    Ok(cases)
}
