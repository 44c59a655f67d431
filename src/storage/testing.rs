//! In-memory [`Store`] that records every call, for worker and cleanup tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::store::{Store, StoreError};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Execute { sql: String, args: Vec<String> },
    Columns(String),
    TableNames,
    SizeBytes,
    Compact,
}

/// Fake store with a fixed schema and scripted failures.
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub tables: BTreeMap<String, Vec<String>>,
    pub size: u64,
    /// Statements containing any of these substrings fail.
    pub fail_on: Vec<String>,
    pub fail_compact: bool,
    pub calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingStore {
    pub fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
        self.tables.insert(
            table.to_string(),
            columns.iter().map(|c| (*c).to_string()).collect(),
        );
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<Call>>> {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Store for RecordingStore {
    fn execute(&mut self, sql: &str, args: &[String]) -> Result<usize, StoreError> {
        self.record(Call::Execute {
            sql: sql.to_string(),
            args: args.to_vec(),
        });
        if self.fail_on.iter().any(|needle| sql.contains(needle.as_str())) {
            return Err(StoreError::Database(rusqlite::Error::InvalidQuery));
        }
        Ok(1)
    }

    fn columns(&mut self, table: &str) -> Result<Vec<String>, StoreError> {
        self.record(Call::Columns(table.to_string()));
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }

    fn table_names(&mut self) -> Result<Vec<String>, StoreError> {
        self.record(Call::TableNames);
        Ok(self.tables.keys().cloned().collect())
    }

    fn size_bytes(&self) -> Result<u64, StoreError> {
        self.record(Call::SizeBytes);
        Ok(self.size)
    }

    fn compact(&mut self) -> Result<(), StoreError> {
        self.record(Call::Compact);
        if self.fail_compact {
            return Err(StoreError::Database(rusqlite::Error::InvalidQuery));
        }
        Ok(())
    }
}

/// Executed `INSERT` statements, in order.
pub(crate) fn inserts(calls: &Arc<Mutex<Vec<Call>>>) -> Vec<(String, Vec<String>)> {
    calls
        .lock()
        .unwrap()
        .iter()
        .filter_map(|call| match call {
            Call::Execute { sql, args } if sql.starts_with("INSERT") => {
                Some((sql.clone(), args.clone()))
            }
            _ => None,
        })
        .collect()
}
