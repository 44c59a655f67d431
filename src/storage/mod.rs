//! SQLite storage layer for Datasilo.
//!
//! Provides:
//! - The narrow store contract consumed by the worker and cleanup executor
//! - Schema introspection, identifier validation and table creation
//! - The write lock owning the single write connection
//! - Read connection pool for ad-hoc queries

pub mod lock;
pub mod reader;
pub mod schema;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use lock::WriteLock;
pub use store::{SqliteStore, Store, StoreError};

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "datasilo.db";
