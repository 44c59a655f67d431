//! The store contract and its SQLite implementation.
//!
//! The queue worker and the cleanup executor only ever see [`Store`]; they
//! never hold a raw connection. That keeps both testable against a recording
//! fake and keeps every mutation behind the [`WriteLock`](super::WriteLock).

use rusqlite::{params_from_iter, Connection};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::schema::{self, ColumnDef, SchemaError};

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("unknown table: {0}")]
    UnknownTable(String),
}

/// Narrow read/write contract over the embedded database.
///
/// Arguments are bound positionally as text; SQLite applies column affinity.
pub trait Store: Send {
    /// Execute a statement, returning the number of rows affected.
    fn execute(&mut self, sql: &str, args: &[String]) -> Result<usize, StoreError>;

    /// Column names of `table` in declaration order.
    ///
    /// Returns [`StoreError::UnknownTable`] if the table does not exist.
    fn columns(&mut self, table: &str) -> Result<Vec<String>, StoreError>;

    /// Names of all user tables.
    fn table_names(&mut self) -> Result<Vec<String>, StoreError>;

    /// Current on-disk size of the database file.
    fn size_bytes(&self) -> Result<u64, StoreError>;

    /// Rewrite the database file to reclaim free pages.
    fn compact(&mut self) -> Result<(), StoreError> {
        self.execute("VACUUM", &[]).map(|_| ())
    }
}

/// [`Store`] backed by a single SQLite write connection.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply write pragmas.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        schema::apply_pragmas(&conn)?;
        tracing::debug!(path = %path.display(), "Opened write connection");
        Ok(Self { conn, path })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the write-ahead log next to the database file.
    pub fn wal_path(&self) -> PathBuf {
        let mut wal = self.path.clone().into_os_string();
        wal.push("-wal");
        PathBuf::from(wal)
    }

    /// Borrow the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create a managed table (timestamp column plus `columns`) and its indexes.
    pub fn create_table(&mut self, table: &str, columns: &[ColumnDef]) -> Result<(), StoreError> {
        let statements = schema::create_table_statements(table, columns)?;
        let (create, indexes) = statements.split_at(1);
        self.conn.execute(&create[0], [])?;

        // A missing index only costs query speed
        for stmt in indexes {
            if let Err(e) = self.conn.execute(stmt, []) {
                tracing::warn!(table, error = %e, "Failed to create index");
            }
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn execute(&mut self, sql: &str, args: &[String]) -> Result<usize, StoreError> {
        Ok(self.conn.execute(sql, params_from_iter(args.iter()))?)
    }

    fn columns(&mut self, table: &str) -> Result<Vec<String>, StoreError> {
        let columns = schema::table_columns(&self.conn, table)?;
        if columns.is_empty() {
            return Err(StoreError::UnknownTable(table.to_string()));
        }
        Ok(columns)
    }

    fn table_names(&mut self) -> Result<Vec<String>, StoreError> {
        Ok(schema::table_names(&self.conn)?)
    }

    /// Main file plus write-ahead log: pages parked in the WAL occupy disk
    /// until a checkpoint folds them back.
    fn size_bytes(&self) -> Result<u64, StoreError> {
        let main = fs::metadata(&self.path)?.len();
        let wal = match fs::metadata(self.wal_path()) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        Ok(main + wal)
    }

    fn compact(&mut self) -> Result<(), StoreError> {
        self.conn.execute("VACUUM", [])?;
        // Fold the WAL back into the main file so the size probe sees the result
        self.conn
            .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        Ok(())
    }
}
