mod watcher;

pub use watcher::*;


/// Receives a notification after every successful document publish.
/// The server side uses this to wake parked long-poll clients.
pub trait UpdateSink: Send + Sync + 'static {
    fn document_updated(&self);
}
