//! Observability infrastructure.
//!
//! Provides:
//! - Structured tracing via `tracing-subscriber`
//! - Prometheus metrics for the queue and retention cycles
//! - HTTP endpoints for Prometheus scraping and health checks

pub mod metrics;
pub mod prometheus;
pub mod tracing;
