use std::path::PathBuf;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Watched-file ingest configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IngestConfig {
    /// The JSON document rewritten by the engine process
    #[serde(default = "default_file")]
    pub file: PathBuf,

    /// mtime poll interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Idle period after which the watchdog re-touches the file's mtime
    /// so long-poll clients never appear to hang
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,

    /// Upper bound on the document size in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Number of historic snapshots retained as diff bases
    #[serde(default = "default_history")]
    pub history: usize,

    /// Directory for the daemon log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            file: default_file(),
            poll_interval_ms: default_poll_interval(),
            heartbeat_secs: default_heartbeat(),
            max_bytes: default_max_bytes(),
            history: default_history(),
            log_dir: default_log_dir(),
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "ingest.poll_interval_ms must be > 0".to_string(),
            )));
        }
        if self.heartbeat_secs == 0 {
            return Err(Error::Config(ConfigError::Message(
                "ingest.heartbeat_secs must be > 0".to_string(),
            )));
        }
        if self.history == 0 {
            return Err(Error::Config(ConfigError::Message(
                "ingest.history must be > 0".to_string(),
            )));
        }
        if self.max_bytes == 0 {
            return Err(Error::Config(ConfigError::Message(
                "ingest.max_bytes must be > 0".to_string(),
            )));
        }
        Ok(())
    }
}

fn default_file() -> PathBuf {
    PathBuf::from("analysis.json")
}
fn default_poll_interval() -> u64 {
    100
}
fn default_heartbeat() -> u64 {
    30
}
fn default_max_bytes() -> u64 {
    1_048_576 // 1MiB, full-file rewrite contract
}
fn default_history() -> usize {
    5
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}
