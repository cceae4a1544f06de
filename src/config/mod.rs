//! Configuration for the broadcast daemon.
//!
//! Hierarchical loading with priority:
//! 1. Default values (hardcoded)
//! 2. Main config file (`config/kibitz.toml`, optional)
//! 3. Explicit override file (e.g. per-deployment)
//! 4. Environment variables (highest priority, `KIBITZ__` prefix)

mod ingest;
mod probe;
mod server;
mod viewers;
pub use ingest::*;
pub use probe::*;
pub use server::*;
pub use viewers::*;

#[cfg(test)]
mod config_test;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::Result;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// HTTP surface: listen address, serve paths, long-poll behavior
    #[serde(default)]
    pub server: ServerConfig,
    /// Watched file and re-read/heartbeat timing
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Viewer presence window
    #[serde(default)]
    pub viewers: ViewerConfig,
    /// Hash-probe backends and fan-out timeout
    #[serde(default)]
    pub probe: ProbeConfig,
}

impl Settings {
    /// Load configuration with defaults, optional files and environment
    /// overlay.
    ///
    /// # Arguments
    /// * `override_path` - Optional path to a deployment-specific config file
    pub fn load(override_path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        config = config.add_source(File::with_name("config/kibitz").required(false));

        if let Some(path) = override_path {
            config = config.add_source(File::with_name(path).required(true));
        }

        config = config.add_source(
            Environment::with_prefix("KIBITZ")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = config.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates configuration sanity across all subsystems.
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.ingest.validate()?;
        self.viewers.validate()?;
        self.probe.validate()?;
        Ok(())
    }
}
