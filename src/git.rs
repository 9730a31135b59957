use std::path::{Path, PathBuf};

use git2::Repository;
use serde::Serialize;

use crate::{mlog_debug, Result};

/// Commit the experiment was run from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Revision {
    pub commit: String,
    pub summary: String,
}

impl Revision {
    pub fn unknown() -> Self {
        Self {
            commit: "unknown".to_string(),
            summary: String::new(),
        }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.summary.is_empty() {
            write!(f, "{}", self.commit)
        } else {
            write!(f, "{} {}", self.commit, self.summary)
        }
    }
}

/// Something that can name the current revision.
pub trait RevisionSource {
    fn revision(&self) -> Result<Revision>;
}

/// Reads HEAD of the repository containing `repo_path`.
pub struct GitRevision {
    repo_path: PathBuf,
}

impl GitRevision {
    pub fn new(repo_path: &Path) -> Self {
        Self {
            repo_path: repo_path.to_path_buf(),
        }
    }
}

impl RevisionSource for GitRevision {
    fn revision(&self) -> Result<Revision> {
        let repo = Repository::discover(&self.repo_path)?;
        let commit = repo.head()?.peel_to_commit()?;
        let revision = Revision {
            commit: commit.id().to_string(),
            summary: commit.summary().unwrap_or_default().to_string(),
        };
        mlog_debug!("GitRevision: {}", revision);
        Ok(revision)
    }
}

/// A revision that never changes, for harnesses without a repository.
#[derive(Debug, Clone)]
pub struct FixedRevision(pub Revision);

impl RevisionSource for FixedRevision {
    fn revision(&self) -> Result<Revision> {
        Ok(self.0.clone())
    }
}
