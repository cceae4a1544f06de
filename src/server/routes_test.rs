use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use serde_json::Value;

use crate::chess::START_FEN;
use crate::config::ServerConfig;
use crate::config::ViewerConfig;
use crate::probe::MockProbeBackend;
use crate::probe::ProbeBackend;
use crate::probe::Prober;
use crate::proto::HashProbeLine;
use crate::proto::HashProbeResponse;
use crate::store::DocumentStore;

use super::*;

fn empty_prober() -> Arc<Prober> {
    Arc::new(Prober::new(Vec::new(), Duration::from_secs(5)))
}

fn state_with(config: ServerConfig) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(DocumentStore::new(5)),
        config,
        &ViewerConfig::default(),
    ))
}

fn publish(state: &AppState, value: Value, mtime: u64) {
    state
        .store
        .publish(serde_json::to_vec(&value).unwrap(), mtime)
        .unwrap();
}

#[tokio::test]
async fn serves_the_document_with_version_and_viewer_headers() {
    let state = state_with(ServerConfig::default());
    publish(&state, json!({"a": 1}), 1000);
    let filter = routes(state, empty_prober());

    let resp = warp::test::request()
        .method("GET")
        .path("/analysis.pl?unique=abc")
        .reply(&filter)
        .await;

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["X-RGLM"], "1000");
    assert_eq!(resp.headers()["X-RGNV"], "1");
    assert_eq!(resp.headers()["Vary"], "Accept-Encoding");
    assert!(resp.headers().get("X-RGMV").is_none());
    assert!(resp.headers().get("Content-Encoding").is_none());
    assert_eq!(
        serde_json::from_slice::<Value>(resp.body()).unwrap(),
        json!({"a": 1})
    );
}

#[tokio::test]
async fn unparseable_version_claims_get_the_full_document() {
    let state = state_with(ServerConfig::default());
    publish(&state, json!({"a": 1}), 1000);
    let filter = routes(state, empty_prober());

    let resp = warp::test::request()
        .method("GET")
        .path("/analysis.pl?ims=garbage")
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["X-RGLM"], "1000");
}

#[tokio::test]
async fn gzip_is_negotiated_via_accept_encoding() {
    let state = state_with(ServerConfig::default());
    publish(&state, json!({"a": 1}), 1000);
    let compressed = state.store.current().unwrap().compressed.clone();
    let filter = routes(state, empty_prober());

    let resp = warp::test::request()
        .method("GET")
        .path("/analysis.pl")
        .header("accept-encoding", "gzip, deflate")
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["Content-Encoding"], "gzip");
    assert_eq!(resp.body(), &compressed);
}

#[tokio::test]
async fn stale_client_scripts_are_told_the_minimum_version() {
    let state = state_with(ServerConfig {
        min_client_version: Some(42),
        ..ServerConfig::default()
    });
    publish(&state, json!({"a": 1}), 1000);
    let filter = routes(state, empty_prober());

    let resp = warp::test::request()
        .method("GET")
        .path("/analysis.pl")
        .reply(&filter)
        .await;
    assert_eq!(resp.headers()["X-RGMV"], "42");
}

#[tokio::test]
async fn unknown_paths_get_the_apology_page() {
    let state = state_with(ServerConfig::default());
    let filter = routes(state, empty_prober());

    let resp = warp::test::request()
        .method("GET")
        .path("/no/such/path")
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.body(), "Something went wrong. Sorry.");
}

#[tokio::test]
async fn hash_probe_requires_a_valid_position() {
    let state = state_with(ServerConfig::default());
    let filter = routes(state, empty_prober());

    let resp = warp::test::request()
        .method("GET")
        .path("/hash")
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 400);

    let resp = warp::test::request()
        .method("GET")
        .path("/hash?fen=not%20a%20position")
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn hash_probe_backend_failures_are_a_server_error() {
    let state = state_with(ServerConfig::default());
    // No backends configured counts as a service-side failure.
    let filter = routes(state, empty_prober());

    let path = format!("/hash?fen={}", START_FEN.replace(' ', "%20"));
    let resp = warp::test::request()
        .method("GET")
        .path(&path)
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 500);
}

#[tokio::test]
async fn hash_probe_renders_merged_backend_lines() {
    let mut mock = MockProbeBackend::new();
    mock.expect_name().return_const("mock".to_string());
    mock.expect_probe().returning(|_| {
        Ok(HashProbeResponse {
            root: Some(HashProbeLine {
                found: true,
                depth: 22,
                ..Default::default()
            }),
            line: Vec::new(),
        })
    });
    let prober = Arc::new(Prober::new(
        vec![Arc::new(mock) as Arc<dyn ProbeBackend>],
        Duration::from_secs(5),
    ));
    let state = state_with(ServerConfig::default());
    let filter = routes(state, prober);

    let path = format!("/hash?fen={}", START_FEN.replace(' ', "%20"));
    let resp = warp::test::request()
        .method("GET")
        .path(&path)
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 200);
    let wire: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(wire["root"]["depth"], json!(22));
    assert_eq!(wire["lines"], json!({}));
}

#[tokio::test]
async fn viewer_count_override_is_loopback_only() {
    let state = state_with(ServerConfig::default());
    publish(&state, json!({"a": 1}), 1000);
    let filter = routes(state.clone(), empty_prober());
    let loopback: SocketAddr = "127.0.0.1:9999".parse().unwrap();

    // No remote address (test default) is not loopback.
    let resp = warp::test::request()
        .method("GET")
        .path("/viewer-count?count=1234")
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 403);

    // Forwarded requests are refused even from loopback.
    let resp = warp::test::request()
        .method("GET")
        .path("/viewer-count?count=1234")
        .remote_addr(loopback)
        .header("x-forwarded-for", "203.0.113.9")
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 403);

    let resp = warp::test::request()
        .method("GET")
        .path("/viewer-count?count=1234")
        .remote_addr(loopback)
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(state.count_viewers(), 1234);

    // Garbage counts are rejected.
    let resp = warp::test::request()
        .method("GET")
        .path("/viewer-count?count=lots")
        .remote_addr(loopback)
        .reply(&filter)
        .await;
    assert_eq!(resp.status(), 400);
}
