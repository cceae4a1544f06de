use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::utils::time::now_ms;

/// Approximate concurrent-viewer tracker.
///
/// Every poll request stamps its client id; a count sweeps out entries
/// older than the window and adds parked clients that have not been
/// stamped inside it. An operator override, when set, replaces the
/// computed number entirely.
pub struct ViewerTracker {
    last_seen: DashMap<String, u64>,
    override_count: Mutex<Option<usize>>,
    window_ms: u64,
}

impl ViewerTracker {
    pub fn new(window: Duration) -> Self {
        ViewerTracker {
            last_seen: DashMap::new(),
            override_count: Mutex::new(None),
            window_ms: window.as_millis() as u64,
        }
    }

    /// Records activity from the given client id.
    pub fn mark_seen(&self, client_id: &str) {
        self.last_seen.insert(client_id.to_string(), now_ms());
    }

    /// Replaces the computed count with a fixed value, or restores
    /// automatic counting when given `None`.
    pub fn set_override(&self, count: Option<usize>) {
        *self.override_count.lock() = count;
    }

    /// Number of distinct viewers seen inside the window, plus any
    /// currently parked clients not already counted. Stale entries are
    /// swept as a side effect, so the map never grows unboundedly.
    pub fn count<'a>(&self, parked: impl IntoIterator<Item = &'a str>) -> usize {
        if let Some(n) = *self.override_count.lock() {
            return n;
        }
        let now = now_ms();
        self.last_seen
            .retain(|_, seen| now.saturating_sub(*seen) < self.window_ms);
        let mut count = self.last_seen.len();
        for client_id in parked {
            if !self.last_seen.contains_key(client_id) {
                count += 1;
            }
        }
        count
    }
}
