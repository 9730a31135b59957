use thiserror::Error;

use crate::core::TargetId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Target '{target}' aborted: dependency '{dependency}' failed: {source}")]
    DependencyFailure {
        target: TargetId,
        dependency: TargetId,
        #[source]
        source: Box<Error>,
    },

    #[error("External step failed: {step}: {reason}")]
    ExternalStepFailure { step: String, reason: String },
}

impl Error {
    /// The innermost error, looking through dependency wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::DependencyFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
