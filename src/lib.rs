//! Datasilo: buffered SQLite ingestion with retention enforcement.
//!
//! Writes are accepted immediately and applied asynchronously by a single
//! queue worker. A periodic retention sweep deletes expired rows and compacts
//! the database file once it grows past a configured size.
//!
//! # Architecture
//!
//! - **Bounded job queue**: producers block (or get `QueueError::Full`) when
//!   the buffer is at capacity
//! - **Single worker thread**: jobs execute strictly in submission order
//! - **Retention scheduler**: fixed-period cleanup cycles on the tokio runtime
//! - **Write lock**: one mutex owns the write connection, so a job never
//!   overlaps a cleanup cycle
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`humanize`]: Human-readable durations and byte sizes
//! - [`observability`]: Metrics and tracing setup
//! - [`queue`]: Job queue and worker
//! - [`retention`]: Retention policy, cleanup executor and scheduler
//! - [`server`]: HTTP server setup
//! - [`service`]: HTTP handlers (create, insert, query, delete)
//! - [`storage`]: SQLite persistence layer

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // queue::QueueError is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes, // r#""# is fine for SQL
    clippy::too_many_lines              // Some functions are inherently long
)]

pub mod config;
pub mod humanize;
pub mod observability;
pub mod queue;
pub mod retention;
pub mod server;
pub mod service;
pub mod storage;

use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable) job ID.
///
/// Job IDs only correlate the submission acknowledgment with the worker's
/// log lines; they are never persisted.
///
/// # Example
///
/// ```
/// let id = datasilo::generate_job_id();
/// assert!(id.len() == 36); // UUID string format
/// ```
#[must_use]
pub fn generate_job_id() -> String {
    Uuid::now_v7().to_string()
}
