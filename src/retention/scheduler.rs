//! Fixed-period trigger for cleanup cycles.
//!
//! Ticks are never skipped or coalesced. Each cycle runs on the blocking pool
//! and the loop awaits it before consuming the next tick, so a cycle that
//! outlasts the period delays the next one instead of overlapping it; missed
//! ticks then fire back to back.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::cleanup::CleanupExecutor;
use crate::humanize::HumanDuration;
use crate::storage::Store;

/// Spawn the scheduler loop on the current tokio runtime.
///
/// The first cycle fires one full period after start. The loop exits when
/// `shutdown_rx` observes a change (or its sender is dropped); a cycle that is
/// already running completes first.
pub fn spawn_scheduler<S>(
    executor: CleanupExecutor<S>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    S: Store + 'static,
{
    let executor = Arc::new(executor);
    let period = executor.policy().sweep_interval();

    tokio::spawn(async move {
        tracing::info!(
            period = %HumanDuration(period),
            window = %HumanDuration(executor.policy().window()),
            "Retention scheduler started"
        );

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let executor = Arc::clone(&executor);
                    if let Err(e) = tokio::task::spawn_blocking(move || executor.run_cycle()).await {
                        tracing::error!(error = %e, "Cleanup cycle panicked");
                    }
                }
                _ = shutdown_rx.changed() => {
                    break;
                }
            }
        }

        tracing::info!("Retention scheduler stopped");
    })
}
