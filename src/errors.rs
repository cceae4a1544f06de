use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top level error of the daemon.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or publishing the watched document failed
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Hash-probe fan-out failed
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Configuration loading or validation failed
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Unrecoverable startup or shutdown failure
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl Error {
    /// True for errors caused by the request rather than the service,
    /// mapped to a 4xx instead of a 500.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Probe(ProbeError::InvalidPosition(_)))
    }
}

/// Errors from the file-watching ingest path.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path}: {size} bytes exceeds the {limit} byte document limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Compression failed: {0}")]
    Compression(#[source] std::io::Error),

    #[error("Could not touch {path}: {source}")]
    Touch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the hash-probe fan-out.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("No probe backends configured")]
    EmptyBackendList,

    #[error("Backend {backend} failed: {status}")]
    Backend {
        backend: String,
        status: Box<tonic::Status>,
    },

    #[error("Backend {backend} timed out after {duration:?}")]
    Timeout { backend: String, duration: Duration },
}
