use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::metrics::POLL_REQUESTS;
use crate::store::DocumentAt;
use crate::store::Snapshot;

use super::AppState;
use super::Reply;

/// Answers a document request, parking it until the next publish when
/// the client is already up to date.
///
/// `None` means there is nothing to serve at all (no document has ever
/// been published and the wait could not be honored); the HTTP layer
/// turns that into a 404.
pub async fn poll_document(
    state: Arc<AppState>,
    ims: Option<u64>,
    client_id: Option<String>,
    wants_compressed: bool,
) -> Option<Reply> {
    if let Some(id) = &client_id {
        state.viewers.mark_seen(id);
    }

    // Newer data than the client's version is already on hand.
    if let Some(current_version) = state.store.current_version() {
        if ims.map_or(true, |t| current_version > t) {
            POLL_REQUESTS.with_label_values(&["immediate"]).inc();
            return versioned_reply(&state, ims, wants_compressed);
        }
    }

    debug!(?ims, "parking long-poll request");
    let (id, rx) = state.waiters.park(client_id, wants_compressed);
    let guard = ParkGuard {
        state: state.clone(),
        id,
        armed: true,
    };

    // A publish can land between the version check above and the park;
    // its broadcast drained the set before this record existed, so the
    // wakeup would never arrive.
    if let Some(current_version) = state.store.current_version() {
        if ims.map_or(true, |t| current_version > t) {
            state.waiters.cancel(id);
            guard.disarm();
            POLL_REQUESTS.with_label_values(&["immediate"]).inc();
            return versioned_reply(&state, ims, wants_compressed);
        }
    }

    let reply = match state.config.poll_timeout_secs {
        None => rx.await.ok(),
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), rx).await {
            Ok(result) => result.ok(),
            Err(_) => {
                // Forced flush: answer with what we have, even though
                // it is nothing new.
                state.waiters.cancel(id);
                POLL_REQUESTS.with_label_values(&["timeout"]).inc();
                guard.disarm();
                return versioned_reply(&state, ims, wants_compressed);
            }
        },
    };
    guard.disarm();
    if reply.is_some() {
        POLL_REQUESTS.with_label_values(&["woken"]).inc();
    }
    reply
}

/// Resolves the client's claimed version against the store: a cached
/// diff when possible, the full current document otherwise.
pub(crate) fn versioned_reply(
    state: &AppState,
    ims: Option<u64>,
    wants_compressed: bool,
) -> Option<Reply> {
    let num_viewers = state.count_viewers();
    match state.store.at(ims)? {
        DocumentAt::Diff(entry) => Some(Reply {
            body: if wants_compressed {
                entry.compressed.clone()
            } else {
                entry.plain.clone()
            },
            compressed: wants_compressed,
            last_modified: entry.target,
            num_viewers,
        }),
        DocumentAt::Current(snapshot) => {
            Some(snapshot_reply(&snapshot, wants_compressed, num_viewers))
        }
    }
}

pub(crate) fn snapshot_reply(
    snapshot: &Snapshot,
    wants_compressed: bool,
    num_viewers: usize,
) -> Reply {
    Reply {
        body: if wants_compressed {
            snapshot.compressed.clone()
        } else {
            snapshot.plain.clone()
        },
        compressed: wants_compressed,
        last_modified: snapshot.last_modified,
        num_viewers,
    }
}

/// Unparks the request if its future is dropped mid-wait. The client
/// is about to reconnect, so it stays in the viewer count.
struct ParkGuard {
    state: Arc<AppState>,
    id: u64,
    armed: bool,
}

impl ParkGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ParkGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(waiter) = self.state.waiters.cancel(self.id) {
            POLL_REQUESTS.with_label_values(&["cancelled"]).inc();
            if let Some(client) = &waiter.client_id {
                self.state.viewers.mark_seen(client);
            }
        }
    }
}
