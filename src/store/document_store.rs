use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use tracing::debug;

use crate::Result;

use super::DiffEntry;
use super::Snapshot;

/// Result of a versioned lookup: a minimal patch when the requested
/// timestamp is a known diff base, otherwise the full current snapshot.
#[derive(Debug, Clone)]
pub enum DocumentAt {
    Diff(Arc<DiffEntry>),
    Current(Arc<Snapshot>),
}

struct StoreInner {
    current: Option<Arc<Snapshot>>,
    /// Last K snapshots, oldest first; never contains invalid bases
    history: VecDeque<Arc<Snapshot>>,
    /// base timestamp -> diff to the current snapshot
    diffs: HashMap<u64, Arc<DiffEntry>>,
}

/// Holds the current snapshot plus a short rolling history used purely
/// as diff bases. Single writer (the ingest task); many readers.
pub struct DocumentStore {
    inner: RwLock<StoreInner>,
    /// Lock-free mirror of the current snapshot for the request path
    fast: ArcSwapOption<Snapshot>,
    capacity: usize,
}

impl DocumentStore {
    pub fn new(capacity: usize) -> Self {
        DocumentStore {
            inner: RwLock::new(StoreInner {
                current: None,
                history: VecDeque::with_capacity(capacity),
                diffs: HashMap::new(),
            }),
            fast: ArcSwapOption::const_empty(),
            capacity,
        }
    }

    /// Installs a new generation of the document.
    ///
    /// All diffs against the new target are built (and compressed)
    /// before the snapshot becomes visible, so any historic lookup
    /// against the new timestamp is guaranteed to resolve. A failed
    /// publish leaves the served state intact.
    pub fn publish(&self, raw: Vec<u8>, mtime: u64) -> Result<()> {
        let new_snap = Arc::new(Snapshot::build(raw, mtime)?);

        let mut inner = self.inner.write();

        // Two generations under one mtime: a waiting client claiming
        // that timestamp could hold either, so the old current must
        // never again serve as a diff base.
        if let Some(cur) = inner.current.as_mut() {
            if cur.last_modified == mtime {
                debug!(mtime, "mtime collision; invalidating previous snapshot as diff base");
                Arc::make_mut(cur).invalid_base = true;
            }
        }

        // Prospective ring: rotate the old current in (unless invalid),
        // evict beyond capacity.
        let mut ring = inner.history.clone();
        if let Some(cur) = inner.current.clone() {
            if !cur.invalid_base {
                ring.push_back(cur);
                if ring.len() > self.capacity {
                    ring.pop_front();
                }
            }
        }

        // O(K) diff rebuild: every surviving base's target moves forward.
        let mut diffs = HashMap::with_capacity(ring.len());
        for base in &ring {
            let entry = DiffEntry::build(base, &new_snap)?;
            diffs.insert(base.last_modified, Arc::new(entry));
        }

        inner.history = ring;
        inner.diffs = diffs;
        inner.current = Some(new_snap.clone());
        drop(inner);

        self.fast.store(Some(new_snap));
        Ok(())
    }

    /// The current snapshot, if anything has been published yet.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.fast.load_full()
    }

    /// Version token of the current snapshot.
    pub fn current_version(&self) -> Option<u64> {
        self.fast.load().as_ref().map(|s| s.last_modified)
    }

    /// Resolves a client's claimed version: a cached diff when the
    /// timestamp is a known base, else the full current snapshot.
    pub fn at(&self, ims: Option<u64>) -> Option<DocumentAt> {
        let inner = self.inner.read();
        if let Some(entry) = ims.and_then(|ts| inner.diffs.get(&ts)) {
            return Some(DocumentAt::Diff(entry.clone()));
        }
        inner.current.clone().map(DocumentAt::Current)
    }

    #[cfg(test)]
    pub(crate) fn history_len(&self) -> usize {
        self.inner.read().history.len()
    }

    #[cfg(test)]
    pub(crate) fn diff_base_timestamps(&self) -> Vec<u64> {
        let mut ts: Vec<u64> = self.inner.read().diffs.keys().copied().collect();
        ts.sort_unstable();
        ts
    }
}
