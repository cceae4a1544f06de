use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::config::IngestConfig;
use crate::store::DocumentStore;
use crate::IngestError;
use crate::Result;

use super::UpdateSink;

/// Re-read serialization. At most one read runs at a time; a change
/// signal arriving mid-read queues exactly one follow-up, further
/// signals coalesce into that pending one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Idle,
    Reading,
    ReadingQueued,
}

/// Watches the analysis document and republishes it on every mtime
/// change. Also owns the heartbeat: if nothing has been published for
/// a full heartbeat interval, the file's mtime is touched so that the
/// normal change path fires and parked clients get a reply.
pub struct FileWatcher {
    path: PathBuf,
    poll_interval: Duration,
    heartbeat: Duration,
    max_bytes: u64,
    store: Arc<DocumentStore>,
    sink: Arc<dyn UpdateSink>,
    state: Mutex<ReadState>,
    last_publish: Mutex<Instant>,
}

impl FileWatcher {
    pub fn new(config: &IngestConfig, store: Arc<DocumentStore>, sink: Arc<dyn UpdateSink>) -> Self {
        FileWatcher {
            path: config.file.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            heartbeat: Duration::from_secs(config.heartbeat_secs),
            max_bytes: config.max_bytes,
            store,
            sink,
            state: Mutex::new(ReadState::Idle),
            last_publish: Mutex::new(Instant::now()),
        }
    }

    /// Polls the document's mtime until shutdown, handing every
    /// observed change to [`FileWatcher::on_change`].
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!("Watching {} for changes", self.path.display());
        let mut ticker = tokio::time::interval(self.poll_interval);
        let mut last_seen: Option<u64> = None;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("File watcher shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    match tokio::fs::metadata(&self.path).await {
                        Ok(meta) => {
                            let mtime = mtime_ms(&meta);
                            if last_seen != Some(mtime) {
                                last_seen = Some(mtime);
                                self.on_change();
                            }
                        }
                        // The producer may be mid-replace; next tick retries.
                        Err(e) => debug!("Could not stat {}: {}", self.path.display(), e),
                    }
                }
            }
        }
    }

    /// Signals that the document may have changed. Never blocks; the
    /// actual read runs on a spawned task, with overlapping signals
    /// coalesced into at most one queued re-read.
    pub fn on_change(self: &Arc<Self>) {
        if !self.begin_read() {
            return;
        }
        let watcher = self.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = watcher.reread().await {
                    error!("Failed to reread {}: {}", watcher.path.display(), e);
                }
                if !watcher.finish_read() {
                    return;
                }
            }
        });
    }

    /// Claims the read slot. Returns true when the caller should start
    /// a read; a change arriving mid-read is folded into one queued
    /// follow-up instead.
    pub(crate) fn begin_read(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            ReadState::ReadingQueued => false,
            ReadState::Reading => {
                *state = ReadState::ReadingQueued;
                false
            }
            ReadState::Idle => {
                *state = ReadState::Reading;
                true
            }
        }
    }

    /// Marks the in-flight read finished. Returns true when a queued
    /// change was pending and another read should run.
    pub(crate) fn finish_read(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            ReadState::ReadingQueued => {
                *state = ReadState::Reading;
                true
            }
            _ => {
                *state = ReadState::Idle;
                false
            }
        }
    }

    /// Reads the document and publishes it, then notifies the sink.
    /// Bounded at `max_bytes`; an oversized or unparseable file leaves
    /// the currently served generation in place.
    pub async fn reread(&self) -> Result<()> {
        debug!("Rereading {}", self.path.display());
        let mut file = tokio::fs::File::open(&self.path)
            .await
            .map_err(IngestError::Io)?;
        let meta = file.metadata().await.map_err(IngestError::Io)?;
        if meta.len() > self.max_bytes {
            return Err(IngestError::TooLarge {
                path: self.path.clone(),
                size: meta.len(),
                limit: self.max_bytes,
            }
            .into());
        }
        let mtime = mtime_ms(&meta);
        let mut raw = Vec::with_capacity(meta.len() as usize);
        // The size check above raced with the read; the take() bound
        // keeps a concurrent append from blowing past the limit.
        (&mut file)
            .take(self.max_bytes)
            .read_to_end(&mut raw)
            .await
            .map_err(IngestError::Io)?;
        drop(file);

        self.store.publish(raw, mtime)?;
        *self.last_publish.lock() = Instant::now();
        self.sink.document_updated();
        Ok(())
    }

    /// Touches the file whenever a full heartbeat passes without a
    /// publish, so that every parked client hears from us within
    /// roughly one heartbeat interval.
    pub async fn run_watchdog(self: Arc<Self>, shutdown: CancellationToken) {
        loop {
            let last = *self.last_publish.lock();
            let deadline = last + self.heartbeat;
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep_until(deadline) => {}
            }
            if *self.last_publish.lock() != last {
                // Something was published while we slept; re-arm.
                continue;
            }
            info!("Touching {} due to no other activity", self.path.display());
            if let Err(e) = self.touch() {
                warn!("Could not touch {}: {}", self.path.display(), e);
            }
            // The touch feeds back through the mtime poller; don't
            // tight-loop while that read is still in flight.
            *self.last_publish.lock() = Instant::now();
        }
    }

    /// Bumps the file's mtime without changing its contents.
    pub fn touch(&self) -> Result<()> {
        let file = std::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| IngestError::Touch {
                path: self.path.clone(),
                source: e,
            })?;
        file.set_modified(SystemTime::now())
            .map_err(|e| IngestError::Touch {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(())
    }
}

fn mtime_ms(meta: &std::fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
