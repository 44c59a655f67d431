//! Configuration parsing for the Datasilo server.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Human-readable retention settings that fall back to defaults when unset
//!   or unparsable

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::humanize::{parse_duration, ByteSize, ParseError};
use crate::retention::policy::{
    RetentionPolicy, DEFAULT_RETENTION_WINDOW, DEFAULT_SIZE_LIMIT, DEFAULT_SWEEP_INTERVAL,
};

/// Datasilo: buffered SQLite ingestion with retention sweeps and compaction.
#[derive(Parser, Debug, Clone)]
#[command(name = "datasilo")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "DATASILO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "DATASILO_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Data directory for the SQLite database
    #[arg(short, long, env = "DATASILO_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "DATASILO_LOG_JSON")]
    pub log_json: bool,

    /// Maximum number of buffered write jobs (backpressure control)
    #[arg(long, env = "DATASILO_QUEUE_CAPACITY", default_value_t = 1000)]
    pub queue_capacity: usize,

    /// Size of the reader connection pool
    #[arg(long, env = "DATASILO_READER_POOL_SIZE", default_value_t = 10)]
    pub reader_pool_size: u32,

    /// Maximum row age before deletion, e.g. 24h, 90m, 7d [default: 24h]
    #[arg(long, env = "DATASILO_RETENTION_WINDOW")]
    pub retention_window: Option<String>,

    /// Period between cleanup cycles, capped at the retention window [default: 5m]
    #[arg(long, env = "DATASILO_SWEEP_INTERVAL")]
    pub sweep_interval: Option<String>,

    /// Database size that triggers compaction, e.g. 1GB, 500MB [default: 1GB]
    #[arg(long, env = "DATASILO_SIZE_LIMIT")]
    pub size_limit: Option<String>,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Resolve the retention settings.
    ///
    /// Unset, unparsable, or zero values fall back to their defaults with a
    /// warning rather than aborting startup.
    pub fn retention_policy(&self) -> RetentionPolicy {
        let window = resolve(
            "retention_window",
            self.retention_window.as_deref(),
            DEFAULT_RETENTION_WINDOW,
            parse_duration,
        );
        let sweep_interval = resolve(
            "sweep_interval",
            self.sweep_interval.as_deref(),
            DEFAULT_SWEEP_INTERVAL,
            parse_duration,
        );
        let size_limit = resolve(
            "size_limit",
            self.size_limit.as_deref(),
            ByteSize(DEFAULT_SIZE_LIMIT),
            str::parse::<ByteSize>,
        );

        if sweep_interval > window {
            tracing::warn!(
                ?sweep_interval,
                ?window,
                "Sweep interval exceeds retention window, capping to window"
            );
        }

        RetentionPolicy::new(window, sweep_interval, size_limit.as_u64())
    }

    /// Create a default configuration for testing.
    #[cfg(test)]
    pub fn test_config(data_dir: PathBuf) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0, // Random port
            data_dir,
            log_level: "debug".into(),
            log_json: false,
            queue_capacity: 100,
            reader_pool_size: 2,
            retention_window: None,
            sweep_interval: None,
            size_limit: None,
        }
    }
}

/// Values where zero means "use the default".
trait IsZero {
    fn is_zero(&self) -> bool;
}

impl IsZero for Duration {
    fn is_zero(&self) -> bool {
        Duration::is_zero(self)
    }
}

impl IsZero for ByteSize {
    fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

fn resolve<T>(
    name: &str,
    raw: Option<&str>,
    default: T,
    parse: impl Fn(&str) -> Result<T, ParseError>,
) -> T
where
    T: IsZero,
{
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return default;
    };
    match parse(raw) {
        Ok(value) if !value.is_zero() => value,
        Ok(_) => {
            tracing::warn!(setting = name, value = raw, "Zero value, using default");
            default
        }
        Err(e) => {
            tracing::warn!(setting = name, value = raw, error = %e, "Unparsable value, using default");
            default
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            log_level: "info".into(),
            log_json: false,
            queue_capacity: 1000,
            reader_pool_size: 10,
            retention_window: None,
            sweep_interval: None,
            size_limit: None,
        }
    }
}
