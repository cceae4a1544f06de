use std::path::Path;
use std::sync::Arc;

use kibitz::utils::file_io;
use kibitz::AppState;
use kibitz::DocumentStore;
use kibitz::FileWatcher;
use kibitz::Prober;
use kibitz::Result;
use kibitz::Settings;
use kibitz::UpdateSink;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let override_path = std::env::args().nth(1);
    let settings = Settings::load(override_path.as_deref())?;

    // Initializing Logs
    let _guard = init_observability(&settings.ingest.log_dir)?;

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());
    tokio::spawn(async {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    let store = Arc::new(DocumentStore::new(settings.ingest.history));
    let state = Arc::new(AppState::new(
        store.clone(),
        settings.server.clone(),
        &settings.viewers,
    ));
    let prober = Arc::new(Prober::from_config(&settings.probe)?);

    // The watcher publishes into the store and wakes parked clients
    // through the state.
    let sink: Arc<dyn UpdateSink> = state.clone();
    let watcher = Arc::new(FileWatcher::new(&settings.ingest, store, sink));
    let watcher_shutdown = CancellationToken::new();
    tokio::spawn(watcher.clone().run(watcher_shutdown.clone()));
    tokio::spawn(watcher.clone().run_watchdog(watcher_shutdown.clone()));

    info!(
        port = settings.server.port,
        file = %settings.ingest.file.display(),
        "Serving"
    );
    kibitz::start_server(state, prober, graceful_rx).await;

    watcher_shutdown.cancel();
    println!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(kibitz::IngestError::Io)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(kibitz::IngestError::Io)?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
    }

    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        kibitz::Error::Fatal(format!("Failed to send shutdown signal: {}", e))
    })?;

    info!("Shutdown completed");
    Ok(())
}

fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    let log_file = file_io::open_file_for_append(&log_dir.join("kibitz.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
