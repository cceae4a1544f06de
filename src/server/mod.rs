mod long_poll;
mod routes;
mod wait_set;

pub use long_poll::*;
pub use routes::*;
pub use wait_set::*;

#[cfg(test)]
mod long_poll_test;
#[cfg(test)]
mod routes_test;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::config::ServerConfig;
use crate::config::ViewerConfig;
use crate::ingest::UpdateSink;
use crate::metrics::DOCUMENT_PUBLISHES;
use crate::probe::Prober;
use crate::store::DocumentStore;
use crate::viewers::ViewerTracker;

/// Everything the HTTP handlers share: the document store, the parked
/// request set and the viewer tracker.
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub waiters: WaitSet,
    pub viewers: ViewerTracker,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(store: Arc<DocumentStore>, server: ServerConfig, viewers: &ViewerConfig) -> Self {
        AppState {
            store,
            waiters: WaitSet::default(),
            viewers: ViewerTracker::new(std::time::Duration::from_secs(viewers.window_secs)),
            config: server,
        }
    }

    /// Current viewer count, with everyone still parked included.
    pub fn count_viewers(&self) -> usize {
        let parked = self.waiters.parked_client_ids();
        self.viewers.count(parked.iter().map(String::as_str))
    }

    /// One-shot broadcast: answers every parked request with the full
    /// current snapshot. Requests arriving from here on see the new
    /// generation directly.
    pub fn wake_all(&self) {
        let Some(current) = self.store.current() else {
            return;
        };
        // Count before draining so the parked clients themselves are
        // included.
        let num_viewers = self.count_viewers();
        let woken = self.waiters.drain();
        if woken.is_empty() {
            return;
        }
        info!(
            woken = woken.len(),
            last_modified = current.last_modified,
            "waking parked clients"
        );
        for waiter in woken {
            if let Some(client) = &waiter.client_id {
                self.viewers.mark_seen(client);
            }
            let reply = snapshot_reply(&current, waiter.wants_compressed, num_viewers);
            waiter.send(reply);
        }
    }
}

impl UpdateSink for AppState {
    fn document_updated(&self) {
        DOCUMENT_PUBLISHES.inc();
        self.wake_all();
    }
}

/// Runs the HTTP server until the shutdown channel fires.
pub async fn start_server(
    state: Arc<AppState>,
    prober: Arc<Prober>,
    mut shutdown_signal: watch::Receiver<()>,
) {
    crate::metrics::register_custom_metrics();
    let port = state.config.port;
    let filter = routes(state, prober);
    let (addr, server) =
        warp::serve(filter).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            let _ = shutdown_signal.changed().await;
        });
    info!("HTTP server listening on {}", addr);
    server.await;
}
