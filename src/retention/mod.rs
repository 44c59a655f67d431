//! Retention enforcement: age-based deletion and size-bounded compaction.

pub mod cleanup;
pub mod policy;
pub mod scheduler;

pub use cleanup::{CleanupExecutor, Compaction, CycleReport};
pub use policy::RetentionPolicy;
pub use scheduler::spawn_scheduler;
