use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::config::ViewerConfig;
use crate::store::DocumentStore;

use super::*;

fn publish(store: &DocumentStore, value: Value, mtime: u64) {
    store
        .publish(serde_json::to_vec(&value).unwrap(), mtime)
        .unwrap();
}

fn state_with(config: ServerConfig) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(DocumentStore::new(5)),
        config,
        &ViewerConfig::default(),
    ))
}

async fn wait_parked(state: &AppState, n: usize) {
    for _ in 0..1000 {
        if state.waiters.len() == n {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("never saw {} parked request(s)", n);
}

#[tokio::test]
async fn versionless_requests_get_the_full_document_immediately() {
    let state = state_with(ServerConfig::default());
    publish(&state.store, json!({"a": 1}), 1000);

    let reply = poll_document(state.clone(), None, Some("c1".to_string()), false)
        .await
        .unwrap();
    assert_eq!(reply.last_modified, 1000);
    assert!(!reply.compressed);
    assert_eq!(reply.body, state.store.current().unwrap().plain);
    assert_eq!(reply.num_viewers, 1);
}

#[tokio::test]
async fn known_versions_get_the_cached_diff() {
    let state = state_with(ServerConfig::default());
    publish(&state.store, json!({"a": 1}), 1000);
    publish(&state.store, json!({"a": 2}), 2000);

    let reply = poll_document(state.clone(), Some(1000), None, false)
        .await
        .unwrap();
    assert_eq!(reply.last_modified, 2000);
    let wire: Value = serde_json::from_slice(&reply.body).unwrap();
    assert_eq!(wire, json!([[["a"], 2]]));
}

#[tokio::test]
async fn gzip_negotiation_switches_the_body() {
    let state = state_with(ServerConfig::default());
    publish(&state.store, json!({"a": 1}), 1000);

    let reply = poll_document(state.clone(), None, None, true).await.unwrap();
    assert!(reply.compressed);
    assert_eq!(reply.body, state.store.current().unwrap().compressed);
}

#[tokio::test]
async fn up_to_date_clients_park_and_wake_with_the_full_new_document() {
    let state = state_with(ServerConfig::default());
    publish(&state.store, json!({"a": 1}), 1000);

    let task = tokio::spawn(poll_document(
        state.clone(),
        Some(1000),
        Some("c1".to_string()),
        false,
    ));
    wait_parked(&state, 1).await;

    publish(&state.store, json!({"a": 2}), 2000);
    state.wake_all();

    let reply = task.await.unwrap().unwrap();
    assert_eq!(reply.last_modified, 2000);
    // Wakeups always carry the full snapshot, not the diff to the
    // waiter's old version.
    assert_eq!(reply.body, state.store.current().unwrap().plain);
    assert!(state.waiters.is_empty());
}

#[tokio::test]
async fn requests_arriving_before_any_document_park_too() {
    let state = state_with(ServerConfig::default());
    let task = tokio::spawn(poll_document(state.clone(), None, None, false));
    wait_parked(&state, 1).await;

    publish(&state.store, json!({"first": true}), 1000);
    state.wake_all();

    let reply = task.await.unwrap().unwrap();
    assert_eq!(reply.last_modified, 1000);
}

#[tokio::test]
async fn parked_viewers_are_counted_while_they_sleep() {
    let state = state_with(ServerConfig::default());
    publish(&state.store, json!({"a": 1}), 1000);

    let task = tokio::spawn(poll_document(
        state.clone(),
        Some(1000),
        Some("sleeper".to_string()),
        false,
    ));
    wait_parked(&state, 1).await;
    assert_eq!(state.count_viewers(), 1);

    publish(&state.store, json!({"a": 2}), 2000);
    state.wake_all();
    let reply = task.await.unwrap().unwrap();
    assert_eq!(reply.num_viewers, 1);
}

#[tokio::test]
async fn dropped_connections_unpark_themselves() {
    let state = state_with(ServerConfig::default());
    publish(&state.store, json!({"a": 1}), 1000);

    let task = tokio::spawn(poll_document(
        state.clone(),
        Some(1000),
        Some("flaky".to_string()),
        false,
    ));
    wait_parked(&state, 1).await;

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert!(state.waiters.is_empty());
    // The client is assumed to be reconnecting and stays counted.
    assert_eq!(state.count_viewers(), 1);

    // A later broadcast does not trip over the departed waiter.
    publish(&state.store, json!({"a": 2}), 2000);
    state.wake_all();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn publishes_racing_the_park_are_never_missed() {
    // The broadcast only reaches requests already in the wait set, so a
    // request deciding to park concurrently with a publish must notice
    // the new generation on its own.
    for round in 0..50 {
        let state = state_with(ServerConfig::default());
        publish(&state.store, json!({"gen": 0}), 1000);

        let poller = tokio::spawn(poll_document(state.clone(), Some(1000), None, false));
        publish(&state.store, json!({"gen": 1}), 2000);
        state.wake_all();

        let reply = tokio::time::timeout(Duration::from_secs(2), poller)
            .await
            .unwrap_or_else(|_| panic!("round {}: parked client missed the publish", round))
            .unwrap()
            .unwrap();
        assert_eq!(reply.last_modified, 2000);
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_variant_forces_a_reply_with_unchanged_data() {
    let state = state_with(ServerConfig {
        poll_timeout_secs: Some(30),
        ..ServerConfig::default()
    });
    publish(&state.store, json!({"a": 1}), 1000);

    // Up to date, so the request parks; paused time then runs the
    // 30s timer out instantly.
    let reply = poll_document(state.clone(), Some(1000), None, false)
        .await
        .unwrap();
    assert_eq!(reply.last_modified, 1000);
    assert_eq!(reply.body, state.store.current().unwrap().plain);
    assert!(state.waiters.is_empty());
}
