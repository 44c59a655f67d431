//! Cleanup cycles: retention sweep followed by conditional compaction.
//!
//! A cycle holds the write lock from the first table lookup until compaction
//! finishes. Failures are isolated: one table failing to sweep does not stop
//! the others, and a failed compaction leaves the deletions committed.

use std::time::Instant;

use super::policy::RetentionPolicy;
use crate::observability::metrics;
use crate::storage::schema::{is_timestamp_column, quote_identifier, TIMESTAMP_COLUMN};
use crate::storage::{Store, WriteLock};

/// What happened to the compaction step of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compaction {
    /// Size at or under the limit.
    #[default]
    NotNeeded,
    /// Size over the limit and the store was compacted.
    Completed,
    /// Size over the limit but compaction failed.
    Failed,
    /// The size probe itself failed.
    SizeUnknown,
}

/// Outcome of one cleanup cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub tables_swept: usize,
    pub rows_deleted: usize,
    /// Tables whose sweep failed, with the error message.
    pub failed_tables: Vec<(String, String)>,
    pub size_bytes: Option<u64>,
    pub compaction: Compaction,
}

/// Runs cleanup cycles against the shared store.
pub struct CleanupExecutor<S> {
    lock: WriteLock<S>,
    policy: RetentionPolicy,
}

impl<S: Store> CleanupExecutor<S> {
    pub fn new(lock: WriteLock<S>, policy: RetentionPolicy) -> Self {
        Self { lock, policy }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Run one full cycle, blocking until the write lock is free.
    pub fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        let report = self.lock.with(|store| run_cycle_on(store, &self.policy));
        let elapsed = started.elapsed();

        metrics::record_cleanup_cycle(&report, elapsed.as_secs_f64());
        tracing::info!(
            tables = report.tables_swept,
            rows_deleted = report.rows_deleted,
            failed_tables = report.failed_tables.len(),
            size_bytes = ?report.size_bytes,
            compaction = ?report.compaction,
            elapsed_ms = elapsed.as_millis() as u64,
            "Cleanup cycle complete"
        );
        report
    }
}

/// One cycle against a store the caller already holds exclusively.
pub fn run_cycle_on<S: Store + ?Sized>(store: &mut S, policy: &RetentionPolicy) -> CycleReport {
    let mut report = CycleReport::default();
    sweep(store, policy, &mut report);
    compact_if_oversized(store, policy, &mut report);
    report
}

fn sweep<S: Store + ?Sized>(store: &mut S, policy: &RetentionPolicy, report: &mut CycleReport) {
    let tables = match store.table_names() {
        Ok(tables) => tables,
        Err(e) => {
            tracing::error!(error = %e, "Failed to enumerate tables");
            return;
        }
    };

    let cutoff = [policy.cutoff_modifier()];
    for table in tables {
        match store.columns(&table) {
            Ok(columns) if columns.iter().any(|c| is_timestamp_column(c)) => {}
            Ok(_) => {
                tracing::debug!(table = %table, "Skipping unmanaged table");
                continue;
            }
            Err(e) => {
                tracing::error!(table = %table, error = %e, "Failed to inspect table");
                report.failed_tables.push((table, e.to_string()));
                continue;
            }
        }

        let sql = format!(
            "DELETE FROM {} WHERE {} < datetime('now', ?1)",
            quote_identifier(&table),
            quote_identifier(TIMESTAMP_COLUMN)
        );
        match store.execute(&sql, &cutoff) {
            Ok(deleted) => {
                report.tables_swept += 1;
                report.rows_deleted += deleted;
                metrics::record_rows_deleted(&table, deleted);
                if deleted > 0 {
                    tracing::debug!(table = %table, deleted, "Deleted expired rows");
                }
            }
            Err(e) => {
                tracing::error!(table = %table, error = %e, "Retention delete failed");
                report.failed_tables.push((table, e.to_string()));
            }
        }
    }
}

fn compact_if_oversized<S: Store + ?Sized>(
    store: &mut S,
    policy: &RetentionPolicy,
    report: &mut CycleReport,
) {
    let size = match store.size_bytes() {
        Ok(size) => size,
        Err(e) => {
            tracing::error!(error = %e, "Failed to probe database size");
            report.compaction = Compaction::SizeUnknown;
            return;
        }
    };
    report.size_bytes = Some(size);

    if size <= policy.size_limit() {
        return;
    }

    tracing::info!(
        size_bytes = size,
        limit_bytes = policy.size_limit(),
        "Database exceeded size limit, compacting"
    );
    report.compaction = match store.compact() {
        Ok(()) => Compaction::Completed,
        Err(e) => {
            tracing::error!(error = %e, "Compaction failed");
            Compaction::Failed
        }
    };
}
