//! Prometheus metrics.
//!
//! Key metrics:
//! - datasilo_jobs_accepted_total: Jobs accepted into the queue
//! - datasilo_jobs_executed_total: Jobs inserted, by table
//! - datasilo_jobs_failed_total: Jobs dropped, by reason
//! - datasilo_job_latency_seconds: Enqueue-to-commit latency
//! - datasilo_queue_full_total: Non-blocking submits rejected at capacity
//! - datasilo_cleanup_cycles_total / datasilo_cleanup_duration_seconds
//! - datasilo_rows_deleted_total: Expired rows deleted, by table
//! - datasilo_cleanup_failures_total: Per-table sweep failures
//! - datasilo_compactions_total: Compactions, by outcome
//! - datasilo_database_size_bytes: Last observed database size

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::OnceLock;

use crate::retention::{Compaction, CycleReport};

/// Global metrics instance.
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Datasilo metrics registry.
pub struct Metrics {
    registry: Registry,
    pub jobs_accepted: IntCounter,
    pub jobs_executed: IntCounterVec,
    pub jobs_failed: IntCounterVec,
    pub job_latency: Histogram,
    pub queue_full: IntCounter,
    pub cleanup_cycles: IntCounter,
    pub cleanup_duration: Histogram,
    pub rows_deleted: IntCounterVec,
    pub cleanup_failures: IntCounter,
    pub compactions: IntCounterVec,
    pub database_size: IntGauge,
}

impl Metrics {
    fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let jobs_accepted = IntCounter::new(
            "datasilo_jobs_accepted_total",
            "Jobs accepted into the queue",
        )?;
        let jobs_executed = IntCounterVec::new(
            Opts::new("datasilo_jobs_executed_total", "Jobs inserted successfully"),
            &["table"],
        )?;
        let jobs_failed = IntCounterVec::new(
            Opts::new("datasilo_jobs_failed_total", "Jobs dropped during execution"),
            &["reason"],
        )?;
        let job_latency = Histogram::with_opts(HistogramOpts::new(
            "datasilo_job_latency_seconds",
            "Time from enqueue to committed insert",
        ))?;
        let queue_full = IntCounter::new(
            "datasilo_queue_full_total",
            "Non-blocking submits rejected because the queue was full",
        )?;
        let cleanup_cycles = IntCounter::new(
            "datasilo_cleanup_cycles_total",
            "Completed cleanup cycles",
        )?;
        let cleanup_duration = Histogram::with_opts(HistogramOpts::new(
            "datasilo_cleanup_duration_seconds",
            "Cleanup cycle duration including lock wait",
        ))?;
        let rows_deleted = IntCounterVec::new(
            Opts::new("datasilo_rows_deleted_total", "Expired rows deleted"),
            &["table"],
        )?;
        let cleanup_failures = IntCounter::new(
            "datasilo_cleanup_failures_total",
            "Tables whose retention sweep failed",
        )?;
        let compactions = IntCounterVec::new(
            Opts::new("datasilo_compactions_total", "Compactions attempted"),
            &["outcome"],
        )?;
        let database_size = IntGauge::new(
            "datasilo_database_size_bytes",
            "Database size observed by the last cleanup cycle",
        )?;

        registry.register(Box::new(jobs_accepted.clone()))?;
        registry.register(Box::new(jobs_executed.clone()))?;
        registry.register(Box::new(jobs_failed.clone()))?;
        registry.register(Box::new(job_latency.clone()))?;
        registry.register(Box::new(queue_full.clone()))?;
        registry.register(Box::new(cleanup_cycles.clone()))?;
        registry.register(Box::new(cleanup_duration.clone()))?;
        registry.register(Box::new(rows_deleted.clone()))?;
        registry.register(Box::new(cleanup_failures.clone()))?;
        registry.register(Box::new(compactions.clone()))?;
        registry.register(Box::new(database_size.clone()))?;

        Ok(Self {
            registry,
            jobs_accepted,
            jobs_executed,
            jobs_failed,
            job_latency,
            queue_full,
            cleanup_cycles,
            cleanup_duration,
            rows_deleted,
            cleanup_failures,
            compactions,
            database_size,
        })
    }
}

/// Initialize the metrics system.
///
/// This should be called once at startup. Subsequent calls are ignored.
/// Until it is called, the `record_*` functions are no-ops.
pub fn init_metrics() {
    if METRICS.get().is_some() {
        return;
    }
    match Metrics::new() {
        Ok(m) => {
            let _ = METRICS.set(m);
        }
        Err(e) => tracing::error!(error = %e, "Failed to register metrics"),
    }
}

/// Get the global metrics instance, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Registry to serve on `/metrics`. Initializes metrics if needed.
pub fn prometheus_registry() -> Registry {
    init_metrics();
    METRICS
        .get()
        .map(|m| m.registry.clone())
        .unwrap_or_else(Registry::new)
}

/// Record a job accepted into the queue.
pub fn record_job_accepted() {
    if let Some(m) = METRICS.get() {
        m.jobs_accepted.inc();
    }
}

/// Record a non-blocking submit rejected at capacity.
pub fn record_queue_full() {
    if let Some(m) = METRICS.get() {
        m.queue_full.inc();
    }
}

/// Record a successful insert.
pub fn record_job_executed(table: &str, latency_seconds: f64) {
    if let Some(m) = METRICS.get() {
        m.jobs_executed.with_label_values(&[table]).inc();
        m.job_latency.observe(latency_seconds);
    }
}

/// Record a dropped job.
pub fn record_job_failed(reason: &str) {
    if let Some(m) = METRICS.get() {
        m.jobs_failed.with_label_values(&[reason]).inc();
    }
}

/// Record expired rows deleted from one table.
pub fn record_rows_deleted(table: &str, rows: usize) {
    if let Some(m) = METRICS.get() {
        m.rows_deleted
            .with_label_values(&[table])
            .inc_by(rows as u64);
    }
}

/// Record a finished cleanup cycle.
pub fn record_cleanup_cycle(report: &CycleReport, duration_seconds: f64) {
    if let Some(m) = METRICS.get() {
        m.cleanup_cycles.inc();
        m.cleanup_duration.observe(duration_seconds);
        m.cleanup_failures
            .inc_by(report.failed_tables.len() as u64);
        if let Some(size) = report.size_bytes {
            m.database_size.set(i64::try_from(size).unwrap_or(i64::MAX));
        }
        let outcome = match report.compaction {
            Compaction::Completed => Some("completed"),
            Compaction::Failed => Some("failed"),
            Compaction::NotNeeded | Compaction::SizeUnknown => None,
        };
        if let Some(outcome) = outcome {
            m.compactions.with_label_values(&[outcome]).inc();
        }
    }
}
