use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::metrics::PARKED_CLIENTS;

/// Payload handed to a poll request when it is answered.
#[derive(Debug, Clone)]
pub struct Reply {
    pub body: Bytes,
    pub compressed: bool,
    pub last_modified: u64,
    pub num_viewers: usize,
}

/// One parked long-poll request.
pub struct Waiter {
    pub client_id: Option<String>,
    pub wants_compressed: bool,
    tx: oneshot::Sender<Reply>,
}

impl Waiter {
    pub fn send(self, reply: Reply) {
        // The receiver may have hung up between drain and send.
        let _ = self.tx.send(reply);
    }
}

/// Requests waiting for the next document generation, keyed by a
/// sequence id so a departing request can remove exactly itself.
pub struct WaitSet {
    waiters: Mutex<HashMap<u64, Waiter>>,
    next_id: AtomicU64,
}

impl Default for WaitSet {
    fn default() -> Self {
        WaitSet {
            waiters: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl WaitSet {
    pub fn park(
        &self,
        client_id: Option<String>,
        wants_compressed: bool,
    ) -> (u64, oneshot::Receiver<Reply>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let mut waiters = self.waiters.lock();
        waiters.insert(
            id,
            Waiter {
                client_id,
                wants_compressed,
                tx,
            },
        );
        PARKED_CLIENTS.set(waiters.len() as i64);
        (id, rx)
    }

    /// Removes one parked request, normally because its connection went
    /// away or its timeout fired.
    pub fn cancel(&self, id: u64) -> Option<Waiter> {
        let mut waiters = self.waiters.lock();
        let waiter = waiters.remove(&id);
        PARKED_CLIENTS.set(waiters.len() as i64);
        waiter
    }

    /// Takes every parked request at once; the broadcast is one-shot,
    /// anyone arriving after this parks for the next generation.
    pub fn drain(&self) -> Vec<Waiter> {
        let mut waiters = self.waiters.lock();
        let drained: Vec<Waiter> = waiters.drain().map(|(_, w)| w).collect();
        PARKED_CLIENTS.set(0);
        drained
    }

    /// Client ids of everyone currently parked.
    pub fn parked_client_ids(&self) -> Vec<String> {
        self.waiters
            .lock()
            .values()
            .filter_map(|w| w.client_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.waiters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
