use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// HTTP surface configuration: listen address, serve paths and the
/// long-poll variant in use.
///
/// Two deployment variants exist for parked requests:
/// - `poll_timeout_secs = Some(n)`: force a reply after `n` seconds even
///   with no new data, so clients never wait indefinitely.
/// - `poll_timeout_secs = None` (default): rely on the ingest watchdog
///   touching the file instead; no per-request timer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path serving the long-polled analysis document
    #[serde(default = "default_serve_path")]
    pub serve_path: String,

    /// Path serving hash-probe queries
    #[serde(default = "default_hash_path")]
    pub hash_path: String,

    /// Path accepting the loopback-only viewer-count override
    #[serde(default = "default_control_path")]
    pub control_path: String,

    /// Forced reply timeout for parked requests, in seconds (None relies
    /// on the ingest heartbeat)
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,

    /// Minimum client script version; older clients are told to hard
    /// reload via the `X-RGMV` response header
    #[serde(default)]
    pub min_client_version: Option<u32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            serve_path: default_serve_path(),
            hash_path: default_hash_path(),
            control_path: default_control_path(),
            poll_timeout_secs: None,
            min_client_version: None,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("serve_path", &self.serve_path),
            ("hash_path", &self.hash_path),
            ("control_path", &self.control_path),
        ] {
            if !path.starts_with('/') {
                return Err(Error::Config(ConfigError::Message(format!(
                    "server.{} {:?} must start with '/'",
                    name, path
                ))));
            }
        }

        if self.serve_path == self.hash_path || self.serve_path == self.control_path {
            return Err(Error::Config(ConfigError::Message(
                "server paths must be distinct".to_string(),
            )));
        }

        if self.poll_timeout_secs == Some(0) {
            return Err(Error::Config(ConfigError::Message(
                "server.poll_timeout_secs must be > 0 when set".to_string(),
            )));
        }

        Ok(())
    }
}

fn default_port() -> u16 {
    5000
}
fn default_serve_path() -> String {
    "/analysis.pl".to_string()
}
fn default_hash_path() -> String {
    "/hash".to_string()
}
fn default_control_path() -> String {
    "/viewer-count".to_string()
}
