use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Hash-probe fan-out configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProbeConfig {
    /// gRPC backend endpoints queried in parallel for every probe.
    /// The list order is the deterministic reconciliation order.
    #[serde(default = "default_backends")]
    pub backends: Vec<String>,

    /// Per-backend request timeout in milliseconds. Bounds the lifetime
    /// of in-flight calls, since siblings are not actively cancelled
    /// when one backend errors.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            backends: default_backends(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backends.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "probe.backends must not be empty".to_string(),
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "probe.request_timeout_ms must be > 0".to_string(),
            )));
        }
        Ok(())
    }
}

fn default_backends() -> Vec<String> {
    vec![
        "http://localhost:50051".to_string(),
        "http://localhost:50052".to_string(),
    ]
}
fn default_request_timeout() -> u64 {
    5000
}
