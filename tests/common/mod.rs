//! Test utilities shared by the integration tests.
//!
//! Provides:
//! - Temporary database fixtures
//! - A polling helper for asynchronous effects
//! - A store wrapper that records when each call held the write lock

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use datasilo::storage::reader::ReaderPool;
use datasilo::storage::schema::ColumnDef;
use datasilo::storage::{SqliteStore, Store, StoreError};
use tempfile::TempDir;

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with a temporary database directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// Open the write store, creating `events(date, user, action)`.
    pub fn events_store(&self) -> SqliteStore {
        let mut store = SqliteStore::open(&self.db_path).expect("failed to open store");
        let columns = vec![
            ColumnDef::parse("user TEXT").unwrap(),
            ColumnDef::parse("action TEXT").unwrap(),
        ];
        store
            .create_table("events", &columns)
            .expect("failed to create events");
        store
    }

    /// Open a small reader pool on the fixture database.
    pub fn reader(&self) -> ReaderPool {
        ReaderPool::new(&self.db_path, 2).expect("failed to open reader pool")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for a condition to become true with timeout.
///
/// Returns `true` if the condition was met, `false` if the timeout expired.
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Number of rows in `table`, read through a fresh pool connection.
pub fn count_rows(reader: &ReaderPool, table: &str) -> usize {
    reader.select_rows(table, None).map(|rows| rows.len()).unwrap_or(0)
}

/// Who held the store during an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holder {
    Job,
    Cleanup,
}

/// Time span a single store call was running.
#[derive(Debug, Clone, Copy)]
pub struct Span {
    pub holder: Holder,
    pub start: Instant,
    pub end: Instant,
}

/// [`Store`] wrapper that records the span of every insert and every
/// retention delete, sleeping inside each so overlaps would be visible.
pub struct TimedStore {
    pub inner: SqliteStore,
    pub hold: Duration,
    pub spans: Arc<Mutex<Vec<Span>>>,
}

impl TimedStore {
    pub fn new(inner: SqliteStore, hold: Duration) -> Self {
        Self {
            inner,
            hold,
            spans: Arc::default(),
        }
    }
}

fn timed<T>(
    spans: &Mutex<Vec<Span>>,
    hold: Duration,
    holder: Holder,
    f: impl FnOnce() -> T,
) -> T {
    let start = Instant::now();
    std::thread::sleep(hold);
    let out = f();
    spans.lock().unwrap().push(Span {
        holder,
        start,
        end: Instant::now(),
    });
    out
}

impl Store for TimedStore {
    fn execute(&mut self, sql: &str, args: &[String]) -> Result<usize, StoreError> {
        let holder = if sql.starts_with("INSERT") {
            Holder::Job
        } else {
            Holder::Cleanup
        };
        let spans = Arc::clone(&self.spans);
        timed(&spans, self.hold, holder, || self.inner.execute(sql, args))
    }

    fn columns(&mut self, table: &str) -> Result<Vec<String>, StoreError> {
        self.inner.columns(table)
    }

    fn table_names(&mut self) -> Result<Vec<String>, StoreError> {
        self.inner.table_names()
    }

    fn size_bytes(&self) -> Result<u64, StoreError> {
        timed(&self.spans, self.hold, Holder::Cleanup, || self.inner.size_bytes())
    }

    fn compact(&mut self) -> Result<(), StoreError> {
        self.inner.compact()
    }
}
