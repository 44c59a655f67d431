//! Read connection pool for ad-hoc queries.
//!
//! Uses r2d2 with r2d2_sqlite for pooled read access.
//! Reads are not synchronized with the write lock; SQLite WAL mode gives each
//! reader a consistent snapshot while the worker writes.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::ValueRef;
use rusqlite::OpenFlags;
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

use super::schema::{apply_reader_pragmas, quote_identifier, validate_identifier, SchemaError};

/// Error type for reader pool operations.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Failed to create connection pool: {0}")]
    PoolCreation(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Equality filter for [`ReaderPool::select_rows`].
#[derive(Debug, Clone)]
pub struct RowFilter {
    pub column: String,
    pub value: String,
}

/// Read connection pool for query handlers.
///
/// Provides pooled read-only connections for concurrent access.
#[derive(Clone)]
pub struct ReaderPool {
    pool: Pool<SqliteConnectionManager>,
}

impl ReaderPool {
    /// Create a new reader pool for the given database path.
    ///
    /// The database file must already exist; open the write connection first.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file
    /// * `max_size` - Maximum number of connections in the pool
    pub fn new<P: AsRef<Path>>(db_path: P, max_size: u32) -> Result<Self, ReaderError> {
        let manager = SqliteConnectionManager::file(db_path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX);

        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .connection_customizer(Box::new(ReaderConnectionCustomizer))
            .build(manager)?;

        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>, ReaderError> {
        Ok(self.pool.get()?)
    }

    /// Get the current pool state for monitoring.
    pub fn state(&self) -> r2d2::State {
        self.pool.state()
    }

    /// Select every row of `table`, optionally filtered by one column equality.
    ///
    /// Each row becomes a JSON object keyed by column name.
    pub fn select_rows(
        &self,
        table: &str,
        filter: Option<&RowFilter>,
    ) -> Result<Vec<Map<String, Value>>, ReaderError> {
        validate_identifier(table)?;
        let mut sql = format!("SELECT * FROM {}", quote_identifier(table));
        let mut args = Vec::new();
        if let Some(filter) = filter {
            validate_identifier(&filter.column)?;
            sql.push_str(&format!(" WHERE {} = ?1", quote_identifier(&filter.column)));
            args.push(filter.value.as_str());
        }

        let conn = self.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query_map(rusqlite::params_from_iter(args), |row| {
                let mut object = Map::with_capacity(names.len());
                for (idx, name) in names.iter().enumerate() {
                    object.insert(name.clone(), json_value(row.get_ref(idx)?));
                }
                Ok(object)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::from(String::from_utf8_lossy(t).into_owned()),
    }
}

/// Connection customizer that applies reader pragmas.
#[derive(Debug)]
struct ReaderConnectionCustomizer;

impl r2d2::CustomizeConnection<rusqlite::Connection, rusqlite::Error>
    for ReaderConnectionCustomizer
{
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
        apply_reader_pragmas(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::ColumnDef;
    use crate::storage::{SqliteStore, Store};
    use tempfile::TempDir;

    fn seeded(temp_dir: &TempDir) -> (SqliteStore, ReaderPool) {
        let db_path = temp_dir.path().join("test.db");
        let mut store = SqliteStore::open(&db_path).unwrap();
        let cols = vec![
            ColumnDef::parse("URL TEXT").unwrap(),
            ColumnDef::parse("sURL TEXT").unwrap(),
        ];
        store.create_table("url_shortener", &cols).unwrap();
        for (url, short) in [("https://a.example", "aaaa1111"), ("https://b.example", "bbbb2222")] {
            store
                .execute(
                    "INSERT INTO url_shortener (URL, sURL) VALUES (?, ?)",
                    &[url.to_string(), short.to_string()],
                )
                .unwrap();
        }
        let pool = ReaderPool::new(&db_path, 2).unwrap();
        (store, pool)
    }

    #[test]
    fn test_select_all_rows() {
        let temp_dir = TempDir::new().unwrap();
        let (_store, pool) = seeded(&temp_dir);

        let rows = pool.select_rows("url_shortener", None).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains_key("date"));
        assert_eq!(rows[0]["URL"], "https://a.example");
    }

    #[test]
    fn test_select_with_filter() {
        let temp_dir = TempDir::new().unwrap();
        let (_store, pool) = seeded(&temp_dir);

        let filter = RowFilter {
            column: "sURL".into(),
            value: "bbbb2222".into(),
        };
        let rows = pool.select_rows("url_shortener", Some(&filter)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["URL"], "https://b.example");
    }

    #[test]
    fn test_select_rejects_bad_identifiers() {
        let temp_dir = TempDir::new().unwrap();
        let (_store, pool) = seeded(&temp_dir);

        assert!(matches!(
            pool.select_rows("url_shortener; DROP TABLE x", None),
            Err(ReaderError::Schema(_))
        ));
        let filter = RowFilter {
            column: "1=1 OR sURL".into(),
            value: "x".into(),
        };
        assert!(matches!(
            pool.select_rows("url_shortener", Some(&filter)),
            Err(ReaderError::Schema(_))
        ));
    }

    #[test]
    fn test_select_missing_table_is_database_error() {
        let temp_dir = TempDir::new().unwrap();
        let (_store, pool) = seeded(&temp_dir);
        assert!(matches!(
            pool.select_rows("missing", None),
            Err(ReaderError::Database(_))
        ));
    }
}
