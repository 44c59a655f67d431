//! Bounded job queue drained by a single dedicated worker thread.
//!
//! Producers hold a cloneable [`QueueHandle`]. The worker owns the receiving
//! end of a bounded `tokio::sync::mpsc` channel, so a full queue suspends
//! `submit` until the worker frees a slot. Jobs run strictly in arrival
//! order, one at a time, each under the write lock.
//!
//! Delivery is at-most-once: a job that fails is logged and discarded, and
//! queued jobs are lost if the process dies.

use std::thread::{self, JoinHandle};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use super::job::Job;
use crate::generate_job_id;
use crate::observability::metrics;
use crate::storage::{Store, WriteLock};

/// Error type for queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is full")]
    Full,

    #[error("queue is closed")]
    Closed,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("worker thread panicked")]
    ThreadPanic,
}

/// Acknowledgment that a job was accepted for asynchronous execution.
///
/// This says nothing about whether the insert will succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub job_id: String,
}

struct Envelope {
    job_id: String,
    job: Job,
    enqueued_at: Instant,
}

enum QueueCommand {
    Run(Envelope),
    /// Sent after every previously accepted job, so the worker drains first.
    Shutdown(oneshot::Sender<()>),
}

/// Producer side of the job queue.
#[derive(Clone)]
pub struct QueueHandle {
    sender: mpsc::Sender<QueueCommand>,
}

impl QueueHandle {
    fn envelope(job: Job) -> (QueueCommand, Accepted) {
        let job_id = generate_job_id();
        let accepted = Accepted {
            job_id: job_id.clone(),
        };
        let command = QueueCommand::Run(Envelope {
            job_id,
            job,
            enqueued_at: Instant::now(),
        });
        (command, accepted)
    }

    /// Enqueue a job, waiting while the queue is at capacity.
    pub async fn submit(&self, job: Job) -> Result<Accepted, QueueError> {
        let (command, accepted) = Self::envelope(job);
        self.sender
            .send(command)
            .await
            .map_err(|_| QueueError::Closed)?;
        metrics::record_job_accepted();
        Ok(accepted)
    }

    /// Enqueue a job without waiting; fails with [`QueueError::Full`] at capacity.
    pub fn try_submit(&self, job: Job) -> Result<Accepted, QueueError> {
        let (command, accepted) = Self::envelope(job);
        self.sender.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => {
                metrics::record_queue_full();
                QueueError::Full
            }
            TrySendError::Closed(_) => QueueError::Closed,
        })?;
        metrics::record_job_accepted();
        Ok(accepted)
    }

    /// Enqueue a job from a plain OS thread, blocking while the queue is full.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context.
    pub fn blocking_submit(&self, job: Job) -> Result<Accepted, QueueError> {
        let (command, accepted) = Self::envelope(job);
        self.sender
            .blocking_send(command)
            .map_err(|_| QueueError::Closed)?;
        metrics::record_job_accepted();
        Ok(accepted)
    }

    /// Maximum number of buffered jobs.
    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    /// Number of jobs currently waiting in the buffer.
    pub fn depth(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// True once the worker has stopped accepting jobs.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Ask the worker to stop once every job accepted so far has run.
    ///
    /// Submits racing with the shutdown either land before it is processed
    /// (and run) or fail with [`QueueError::Closed`].
    pub async fn shutdown(&self) -> Result<(), QueueError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.sender
            .send(QueueCommand::Shutdown(done_tx))
            .await
            .map_err(|_| QueueError::Closed)?;
        done_rx.await.map_err(|_| QueueError::ThreadPanic)
    }
}

/// The job queue and its worker thread.
pub struct JobQueue {
    handle: QueueHandle,
    thread: JoinHandle<()>,
}

impl JobQueue {
    /// Spawn the worker thread draining a queue of `capacity` jobs.
    ///
    /// A capacity of zero is raised to one.
    pub fn spawn<S>(lock: WriteLock<S>, capacity: usize) -> Result<Self, QueueError>
    where
        S: Store + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let thread = thread::Builder::new()
            .name("datasilo-worker".into())
            .spawn(move || run_worker(&lock, receiver))
            .map_err(QueueError::Spawn)?;

        Ok(Self {
            handle: QueueHandle { sender },
            thread,
        })
    }

    /// Get a producer handle.
    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    /// Wait for the worker thread to exit.
    ///
    /// The worker exits after a [`QueueHandle::shutdown`] or once every
    /// handle has been dropped and the buffer is empty.
    pub fn join(self) -> Result<(), QueueError> {
        drop(self.handle);
        self.thread.join().map_err(|_| QueueError::ThreadPanic)
    }
}

fn run_worker<S: Store>(lock: &WriteLock<S>, mut receiver: mpsc::Receiver<QueueCommand>) {
    tracing::info!("Queue worker started");

    let mut acks = Vec::new();
    while let Some(command) = receiver.blocking_recv() {
        match command {
            QueueCommand::Run(envelope) => execute_envelope(lock, envelope),
            QueueCommand::Shutdown(done) => {
                // New sends now fail; jobs already buffered still run below
                if acks.is_empty() {
                    receiver.close();
                    tracing::info!("Queue closed, draining");
                }
                acks.push(done);
            }
        }
    }

    tracing::info!("Queue worker stopped");
    for done in acks {
        let _ = done.send(());
    }
}

fn execute_envelope<S: Store>(lock: &WriteLock<S>, envelope: Envelope) {
    let Envelope {
        job_id,
        job,
        enqueued_at,
    } = envelope;

    let started = Instant::now();
    let result = lock.with(|store| job.execute(store));

    match result {
        Ok(rows) => {
            metrics::record_job_executed(job.table(), enqueued_at.elapsed().as_secs_f64());
            tracing::debug!(
                job_id = %job_id,
                table = job.table(),
                rows,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Job executed"
            );
        }
        Err(e) => {
            metrics::record_job_failed(e.kind());
            tracing::error!(
                job_id = %job_id,
                table = job.table(),
                error = %e,
                "Job dropped"
            );
        }
    }
}
