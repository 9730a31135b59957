//! Per-case output directories.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::params::CaseId;
use crate::{mlog_debug, Error, Result};

/// Directory layout under the output root:
/// `<root>/<model>/outputs/<case>` and `<root>/<model>/data`.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn case_dir(&self, model: &str, case: &str) -> PathBuf {
        self.root.join(model).join("outputs").join(case)
    }

    pub fn data_dir(&self, model: &str) -> PathBuf {
        self.root.join(model).join("data")
    }

    /// Create the directory of every case. Existing directories and their
    /// contents are left alone. A case that is not a single plain path
    /// component is rejected before anything is created.
    pub fn ensure_case_dirs(&self, model: &str, cases: &[CaseId]) -> Result<()> {
        if let Some(case) = cases.iter().find(|case| !is_plain_component(case)) {
            return Err(Error::Configuration(format!(
                "Case '{}' does not name a directory under {}",
                case,
                self.root.join(model).join("outputs").display()
            )));
        }
        for case in cases {
            let dir = self.case_dir(model, case);
            if !dir.exists() {
                mlog_debug!("Creating case directory: {}", dir.display());
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }

    pub fn ensure_data_dir(&self, model: &str) -> Result<PathBuf> {
        let dir = self.data_dir(model);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

fn is_plain_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
