use bytes::Bytes;

use crate::delta;
use crate::delta::Stanza;
use crate::IngestError;

use super::gzip;
use super::Snapshot;

/// A cached structural diff from one historic snapshot to the current
/// one. Keyed in the store by the base's timestamp; recomputed in full
/// whenever the current snapshot changes.
#[derive(Debug, Clone)]
pub struct DiffEntry {
    /// Diff stanzas, kept parsed for tests and introspection
    pub stanzas: Vec<Stanza>,
    /// Serialized diff body
    pub plain: Bytes,
    /// Gzipped diff body
    pub compressed: Bytes,
    /// Timestamp of the snapshot this diff patches up to
    pub target: u64,
}

impl DiffEntry {
    /// Diffs `base` against `current`, serializing and compressing the
    /// result so it can be handed out without further work.
    pub fn build(base: &Snapshot, current: &Snapshot) -> std::result::Result<Self, IngestError> {
        let stanzas = delta::diff(&base.parsed, &current.parsed);
        let plain = serde_json::to_vec(&stanzas)?;
        let compressed = gzip(&plain)?;
        Ok(DiffEntry {
            stanzas,
            plain: Bytes::from(plain),
            compressed,
            target: current.last_modified,
        })
    }
}
