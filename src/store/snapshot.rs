use std::io::Write;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;

use crate::IngestError;

/// One immutable parsed+serialized generation of the distributed
/// document. Produced exactly once per file-change event; owned
/// exclusively by the store until superseded.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Structured tree, used only as a diff endpoint
    pub parsed: Value,
    /// Raw document bytes as read from disk
    pub plain: Bytes,
    /// Gzipped document bytes
    pub compressed: Bytes,
    /// File modification time in milliseconds; the version token
    pub last_modified: u64,
    /// Set when a later publish reused this snapshot's mtime: a client
    /// claiming that timestamp may hold either generation, so this
    /// snapshot must never again serve as a diff base.
    pub invalid_base: bool,
}

impl Snapshot {
    /// Parses and compresses raw document bytes. Any failure aborts the
    /// publish attempt with no state change.
    pub fn build(raw: Vec<u8>, mtime: u64) -> std::result::Result<Self, IngestError> {
        let parsed: Value = serde_json::from_slice(&raw)?;
        let compressed = gzip(&raw)?;
        Ok(Snapshot {
            parsed,
            plain: Bytes::from(raw),
            compressed,
            last_modified: mtime,
            invalid_base: false,
        })
    }
}

/// Gzips a body for clients advertising `Accept-Encoding: gzip`.
pub(crate) fn gzip(data: &[u8]) -> std::result::Result<Bytes, IngestError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(IngestError::Compression)?;
    let buffer = encoder.finish().map_err(IngestError::Compression)?;
    Ok(Bytes::from(buffer))
}
