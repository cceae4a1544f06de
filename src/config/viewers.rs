use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Viewer presence tracking configuration.
///
/// The liveness window is short (5s) when clients hit the daemon
/// directly, longer (60s) when a fronting cache absorbs most requests
/// and the count is pushed in through the control endpoint anyway.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ViewerConfig {
    /// Liveness window in seconds; clients unseen for longer are purged
    #[serde(default = "default_window")]
    pub window_secs: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window(),
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            return Err(Error::Config(ConfigError::Message(
                "viewers.window_secs must be > 0".to_string(),
            )));
        }
        Ok(())
    }
}

fn default_window() -> u64 {
    5
}
