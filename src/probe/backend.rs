use tonic::async_trait;
use tonic::transport::Endpoint;

use crate::proto::hash_probe_client::HashProbeClient;
use crate::proto::HashProbeRequest;
use crate::proto::HashProbeResponse;
use crate::Error;
use crate::Result;

#[cfg(test)]
use mockall::automock;

/// One transposition-table service. The trait seam keeps the fan-out
/// and merge logic testable without live gRPC endpoints.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProbeBackend: Send + Sync + 'static {
    /// Stable identifier used in logs and error reports.
    fn name(&self) -> String;

    async fn probe(&self, fen: &str) -> std::result::Result<HashProbeResponse, tonic::Status>;
}

/// gRPC-backed probe target. The channel connects lazily, so startup
/// does not depend on backend availability.
pub struct GrpcProbeBackend {
    addr: String,
    client: HashProbeClient,
}

impl GrpcProbeBackend {
    pub fn connect_lazy(addr: &str) -> Result<Self> {
        let endpoint = Endpoint::from_shared(addr.to_string()).map_err(|e| {
            Error::Config(config::ConfigError::Message(format!(
                "invalid probe backend address {}: {}",
                addr, e
            )))
        })?;
        Ok(GrpcProbeBackend {
            addr: addr.to_string(),
            client: HashProbeClient::new(endpoint.connect_lazy()),
        })
    }
}

#[async_trait]
impl ProbeBackend for GrpcProbeBackend {
    fn name(&self) -> String {
        self.addr.clone()
    }

    async fn probe(&self, fen: &str) -> std::result::Result<HashProbeResponse, tonic::Status> {
        let mut client = self.client.clone();
        let response = client
            .probe(HashProbeRequest {
                fen: fen.to_string(),
            })
            .await?;
        Ok(response.into_inner())
    }
}
