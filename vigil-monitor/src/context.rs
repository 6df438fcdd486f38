//! Everything a check needs to run: config, logger, shared state, and the
//! HTTP client. One context is shared across all timer tasks.

use crate::state::MonitorState;
use std::time::Duration;
use vigil_core::{MonitorConfig, VigilError};
use vigil_observability::MonitorLogger;

pub struct MonitorContext {
    pub config: MonitorConfig,
    pub logger: MonitorLogger,
    pub state: MonitorState,
    pub client: reqwest::Client,
}

impl MonitorContext {
    /// Build a context, opening the log files under `config.log.dir`.
    pub fn new(config: MonitorConfig) -> Result<Self, VigilError> {
        let logger = MonitorLogger::new(&config.log, config.echo_to_console())?;
        Ok(Self {
            config,
            logger,
            state: MonitorState::new(),
            client: reqwest::Client::new(),
        })
    }

    /// Per-probe request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.thresholds.request_timeout_secs)
    }

    /// Sliding error-window length.
    pub fn error_window(&self) -> Duration {
        Duration::from_secs(self.config.alert.window_secs)
    }
}
