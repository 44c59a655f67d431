//! HTTP server setup and lifecycle.
//!
//! Wires together:
//! - The single-writer job queue and its worker thread
//! - The retention scheduler
//! - The reader pool for queries
//! - Axum routes plus the observability endpoints
//!
//! Shutdown order: stop accepting requests, stop the scheduler, drain the
//! queue, join the worker.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::Config;
use crate::observability::metrics::prometheus_registry;
use crate::observability::prometheus::{self, PrometheusState};
use crate::queue::{JobQueue, QueueHandle};
use crate::retention::{spawn_scheduler, CleanupExecutor, RetentionPolicy};
use crate::service;
use crate::storage::reader::ReaderPool;
use crate::storage::{SqliteStore, WriteLock, DB_FILE_NAME};

/// Server state shared across handlers.
pub struct ServerState {
    pub queue: QueueHandle,
    pub lock: WriteLock<SqliteStore>,
    pub reader_pool: ReaderPool,
}

/// Build the full router: application routes merged with `/metrics`,
/// `/health` and `/ready`.
pub fn app(state: Arc<ServerState>) -> axum::Router {
    let observability =
        PrometheusState::new(prometheus_registry()).with_queue(state.queue.clone());
    service::router(state).merge(prometheus::create_router(observability))
}

/// Run the Datasilo HTTP server.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `policy` - Retention settings, resolved once by the caller
/// * `shutdown_rx` - Receiver for shutdown signal
///
/// # Returns
///
/// Returns once the server has stopped and every accepted job has run.
pub async fn run_server(
    config: Config,
    policy: RetentionPolicy,
    shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen address")?;
    let db_path = config.data_dir.join(DB_FILE_NAME);

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let lock = WriteLock::new(store);

    // Spawn worker thread
    let queue = JobQueue::spawn(lock.clone(), config.queue_capacity)?;
    let queue_handle = queue.handle();

    let reader_pool = ReaderPool::new(&db_path, config.reader_pool_size)?;

    let scheduler = spawn_scheduler(
        CleanupExecutor::new(lock.clone(), policy),
        shutdown_rx.clone(),
    );

    let state = Arc::new(ServerState {
        queue: queue_handle.clone(),
        lock,
        reader_pool,
    });

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(address = %listener.local_addr()?, "Starting Datasilo HTTP server");

    let mut server_shutdown = shutdown_rx;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
            tracing::info!("Shutdown signal received, stopping server");
        })
        .await?;

    if let Err(e) = scheduler.await {
        tracing::error!(error = %e, "Retention scheduler task failed");
    }

    tracing::info!("Draining job queue");
    queue_handle.shutdown().await?;
    tokio::task::spawn_blocking(move || queue.join()).await??;

    tracing::info!("Server stopped");
    Ok(())
}
