use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tracing::debug;

use crate::config::ProbeConfig;
use crate::proto::HashProbeResponse;
use crate::ProbeError;
use crate::Result;

use super::GrpcProbeBackend;
use super::ProbeBackend;

/// Fans one position out to every configured backend in parallel.
/// All-or-nothing: one failed or timed-out backend fails the whole
/// probe, and the per-call timeout bounds how long that can take.
pub struct Prober {
    backends: Vec<Arc<dyn ProbeBackend>>,
    request_timeout: Duration,
}

impl Prober {
    pub fn new(backends: Vec<Arc<dyn ProbeBackend>>, request_timeout: Duration) -> Self {
        Prober {
            backends,
            request_timeout,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        let backends = config
            .backends
            .iter()
            .map(|addr| {
                GrpcProbeBackend::connect_lazy(addr)
                    .map(|b| Arc::new(b) as Arc<dyn ProbeBackend>)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Prober::new(
            backends,
            Duration::from_millis(config.request_timeout_ms),
        ))
    }

    /// One response per backend, in configuration order.
    pub async fn probe(&self, fen: &str) -> Result<Vec<HashProbeResponse>> {
        if self.backends.is_empty() {
            return Err(ProbeError::EmptyBackendList.into());
        }
        debug!(fen, backends = self.backends.len(), "probing position");
        let calls = self.backends.iter().map(|backend| {
            let backend = backend.clone();
            let fen = fen.to_string();
            let timeout = self.request_timeout;
            async move {
                match tokio::time::timeout(timeout, backend.probe(&fen)).await {
                    Ok(Ok(response)) => Ok(response),
                    Ok(Err(status)) => Err(ProbeError::Backend {
                        backend: backend.name(),
                        status: Box::new(status),
                    }),
                    Err(_) => Err(ProbeError::Timeout {
                        backend: backend.name(),
                        duration: timeout,
                    }),
                }
            }
        });
        let responses = try_join_all(calls).await?;
        Ok(responses)
    }
}
