//! Asynchronous write buffering.
//!
//! Provides:
//! - [`Job`] validation and insert planning
//! - The bounded [`JobQueue`] with its single worker thread

pub mod job;
pub mod worker;

pub use job::{ExecutionError, InsertPlan, Job, JobError};
pub use worker::{Accepted, JobQueue, QueueError, QueueHandle};
