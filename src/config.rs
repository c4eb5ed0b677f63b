//! Runner configuration loaded from `wfrunner.toml`.
//!
//! [`RunnerConfig`] holds every tunable of the runner. Values missing from
//! the file take defaults. The `WFRUNNER_WORKFLOW_DIR` and `WFRUNNER_LOG`
//! environment variables take precedence over the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::hooks::TROUBLESHOOTING_URL;

pub const CONFIG_FILE: &str = "wfrunner.toml";

/// Top-level configuration loaded from `wfrunner.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Directory holding the workflow templates.
    #[serde(default = "default_workflow_dir")]
    pub workflow_dir: PathBuf,

    /// Upper bound on attempts for one run, retries included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linked from the machine-series fallback diagnostic.
    #[serde(default = "default_troubleshooting_url")]
    pub troubleshooting_url: String,

    /// `tracing_subscriber` filter directive.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_workflow_dir() -> PathBuf {
    PathBuf::from("workflows")
}

fn default_max_attempts() -> u32 {
    3
}

fn default_troubleshooting_url() -> String {
    TROUBLESHOOTING_URL.to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workflow_dir: default_workflow_dir(),
            max_attempts: default_max_attempts(),
            troubleshooting_url: default_troubleshooting_url(),
            log_filter: default_log_filter(),
        }
    }
}

impl RunnerConfig {
    /// Loads `wfrunner.toml` from the current directory.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Loads the configuration at `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<RunnerConfig>(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(dir) = std::env::var("WFRUNNER_WORKFLOW_DIR")
            && !dir.is_empty()
        {
            config.workflow_dir = PathBuf::from(dir);
        }
        if let Ok(filter) = std::env::var("WFRUNNER_LOG")
            && !filter.is_empty()
        {
            config.log_filter = filter;
        }

        Ok(config)
    }

    /// Full path of the workflow template `name`.
    pub fn workflow_path(&self, name: &str) -> PathBuf {
        self.workflow_dir.join(name)
    }
}
