use std::sync::Arc;
use std::time::Duration;

use tonic::async_trait;

use crate::proto::HashProbeResponse;
use crate::Error;
use crate::ProbeError;

use super::*;

fn response_with_depth(depth: u32) -> HashProbeResponse {
    HashProbeResponse {
        root: Some(crate::proto::HashProbeLine {
            found: true,
            depth,
            ..Default::default()
        }),
        line: Vec::new(),
    }
}

fn ok_backend(name: &str, depth: u32) -> Arc<dyn ProbeBackend> {
    let mut mock = MockProbeBackend::new();
    mock.expect_name().return_const(name.to_string());
    mock.expect_probe()
        .returning(move |_| Ok(response_with_depth(depth)));
    Arc::new(mock)
}

/// Answers after a fixed delay; mockall cannot model that.
struct SlowBackend {
    delay: Duration,
}

#[async_trait]
impl ProbeBackend for SlowBackend {
    fn name(&self) -> String {
        "slow".to_string()
    }

    async fn probe(&self, _fen: &str) -> std::result::Result<HashProbeResponse, tonic::Status> {
        tokio::time::sleep(self.delay).await;
        Ok(response_with_depth(1))
    }
}

#[tokio::test]
async fn responses_come_back_in_backend_order() {
    let prober = Prober::new(
        vec![ok_backend("one", 11), ok_backend("two", 22)],
        Duration::from_secs(5),
    );
    let responses = prober.probe("fen").await.unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].root.as_ref().unwrap().depth, 11);
    assert_eq!(responses[1].root.as_ref().unwrap().depth, 22);
}

#[tokio::test]
async fn one_failing_backend_fails_the_whole_probe() {
    let mut failing = MockProbeBackend::new();
    failing.expect_name().return_const("bad".to_string());
    failing
        .expect_probe()
        .returning(|_| Err(tonic::Status::internal("table unavailable")));

    let prober = Prober::new(
        vec![ok_backend("good", 11), Arc::new(failing)],
        Duration::from_secs(5),
    );
    match prober.probe("fen").await {
        Err(Error::Probe(ProbeError::Backend { backend, .. })) => assert_eq!(backend, "bad"),
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn slow_backends_are_cut_off_by_the_timeout() {
    let prober = Prober::new(
        vec![Arc::new(SlowBackend {
            delay: Duration::from_secs(60),
        })],
        Duration::from_secs(5),
    );
    match prober.probe("fen").await {
        Err(Error::Probe(ProbeError::Timeout { backend, duration })) => {
            assert_eq!(backend, "slow");
            assert_eq!(duration, Duration::from_secs(5));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn probing_with_no_backends_is_an_error() {
    let prober = Prober::new(Vec::new(), Duration::from_secs(5));
    assert!(matches!(
        prober.probe("fen").await,
        Err(Error::Probe(ProbeError::EmptyBackendList))
    ));
}
