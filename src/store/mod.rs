//! Versioned document store: the current snapshot, a short history ring
//! of diff bases, and the diff cache rebuilt on every publish.

mod diff_cache;
mod document_store;
mod snapshot;
pub use diff_cache::*;
pub use document_store::*;
pub use snapshot::*;
