//! Tracing initialisation for binaries embedding the runner.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::config::RunnerConfig;

/// Installs a global formatter filtered by `config.log_filter`.
pub fn init_logging(config: &RunnerConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_filter)
        .map_err(|e| anyhow!("invalid log filter {:?}: {e}", config.log_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_filter() {
        let config = RunnerConfig {
            log_filter: "wfrunner=notalevel".into(),
            ..Default::default()
        };
        assert!(init_logging(&config).is_err());
    }
}
