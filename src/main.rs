//! Datasilo: buffered SQLite ingestion with retention sweeps and compaction.
//!
//! # Usage
//!
//! ```bash
//! datasilo --port 8080 --data-dir ./data --retention-window 24h --size-limit 1GB
//! ```
//!
//! Environment variables can also be used:
//! - `DATASILO_PORT`: Port to listen on
//! - `DATASILO_DATA_DIR`: Data directory for SQLite
//! - `DATASILO_RETENTION_WINDOW`, `DATASILO_SWEEP_INTERVAL`, `DATASILO_SIZE_LIMIT`
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Context;
use datasilo::config::Config;
use datasilo::humanize::{ByteSize, HumanDuration};
use datasilo::observability::metrics::init_metrics;
use datasilo::observability::tracing::init_tracing;
use datasilo::retention::RetentionPolicy;
use datasilo::server::run_server;
use std::fs;
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config, policy: &RetentionPolicy) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
   ____        _            _ _
  |  _ \  __ _| |_ __ _ ___(_) | ___
  | | | |/ _` | __/ _` / __| | |/ _ \
  | |_| | (_| | || (_| \__ \ | | (_) |
  |____/ \__,_|\__\__,_|___/_|_|\___/

  Datasilo v{}

  Configuration:
    Address:    {}:{}
    Data Dir:   {}
    Queue:      {} jobs
    Retention:  {} (sweep every {})
    Size Limit: {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.host,
        config.port,
        config.data_dir.display(),
        config.queue_capacity,
        HumanDuration(policy.window()),
        HumanDuration(policy.sweep_interval()),
        ByteSize(policy.size_limit()),
    );
}

/// Resolve once SIGINT or SIGTERM arrives.
async fn wait_for_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for ctrl+c")?;
                tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for ctrl+c")?;
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse_args();

    init_tracing(&config.log_level, config.log_json);
    init_metrics();

    fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create {}", config.data_dir.display()))?;

    let policy = config.retention_policy();
    print_banner(&config, &policy);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            tracing::error!(error = %e, "Signal handling failed");
        }
        let _ = shutdown_tx.send(true);
    });

    run_server(config, policy, shutdown_rx).await?;

    tracing::info!("Datasilo shutdown complete");
    Ok(())
}
