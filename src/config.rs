use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::DEFAULT_REPETITIONS;
use crate::step::Tool;
use crate::{mlog_debug, Error, Result};

pub const CONFIG_FILE: &str = "meshflow.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: String,
    pub num_training_cases: i64,
    pub approaches: Vec<String>,
    /// Passed through to every solver step untouched.
    pub solver_options: String,
    /// Testing manifest; defaults to `<model>/testing_cases.txt`.
    pub manifest: Option<PathBuf>,
    pub output_root: PathBuf,
    pub timing_log: PathBuf,
    pub profile: ProfileConfig,
    pub snapshot: SnapshotConfig,
    /// Command overrides keyed by tool name, e.g. `train = ["python3", "train.py"]`.
    pub tools: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub repetitions: usize,
    /// Appended to the solver options of profiling runs.
    pub options: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Appended to the solver options of snapshot runs.
    pub options: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "steady_turbine".to_string(),
            num_training_cases: 100,
            approaches: vec!["anisotropic".to_string()],
            solver_options: "-dm_plex_metric_hausdorff_number 1".to_string(),
            manifest: None,
            output_root: PathBuf::from("."),
            timing_log: PathBuf::from("timing.log"),
            profile: ProfileConfig::default(),
            snapshot: SnapshotConfig::default(),
            tools: BTreeMap::new(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            repetitions: DEFAULT_REPETITIONS,
            options: "-log_view".to_string(),
        }
    }
}

/// Values given on the command line; each one wins over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub num_training_cases: Option<i64>,
    pub approaches: Option<Vec<String>>,
    pub solver_options: Option<String>,
    pub manifest: Option<PathBuf>,
}

impl Config {
    /// Load `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        mlog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            mlog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        mlog_debug!(
            "Config loaded: model={}, num_training_cases={}, approaches={:?}",
            config.model,
            config.num_training_cases,
            config.approaches
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for name in self.tools.keys() {
            if Tool::from_name(name).is_none() {
                return Err(Error::Configuration(format!("Unknown tool '{}'", name)));
            }
        }
        if let Some((name, _)) = self.tools.iter().find(|(_, cmd)| cmd.is_empty()) {
            return Err(Error::Configuration(format!(
                "Command for tool '{}' cannot be empty",
                name
            )));
        }
        Ok(())
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(count) = overrides.num_training_cases {
            self.num_training_cases = count;
        }
        if let Some(approaches) = overrides.approaches {
            self.approaches = approaches;
        }
        if let Some(options) = overrides.solver_options {
            self.solver_options = options;
        }
        if let Some(manifest) = overrides.manifest {
            self.manifest = Some(manifest);
        }
    }

    pub fn manifest_path(&self, base: &Path) -> PathBuf {
        match &self.manifest {
            Some(path) => base.join(path),
            None => base.join(&self.model).join("testing_cases.txt"),
        }
    }

    pub fn output_root(&self, base: &Path) -> PathBuf {
        base.join(&self.output_root)
    }

    pub fn timing_log_path(&self, base: &Path) -> PathBuf {
        base.join(&self.timing_log)
    }

    /// Configured command for `tool`, or its default.
    pub fn command_for(&self, tool: Tool) -> Vec<String> {
        self.tools
            .get(tool.name())
            .cloned()
            .unwrap_or_else(|| tool.default_command())
    }
}
