//! Write jobs: submission-time validation and insert planning.
//!
//! A [`Job`] is validated once when it is built (missing table or values,
//! column/value arity, identifier syntax). Everything that depends on the
//! live schema is checked later, on the worker, by [`Job::plan_insert`].

use thiserror::Error;

use crate::storage::schema::{is_timestamp_column, quote_identifier, validate_identifier};
use crate::storage::{Store, StoreError};

/// Submission-time errors, reported synchronously to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("missing table")]
    MissingTable,

    #[error("missing values")]
    MissingValues,

    #[error("{columns} columns given for {values} values")]
    ArityMismatch { columns: usize, values: usize },

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Execution-time failures. Logged by the worker, never returned to a caller.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("schema lookup failed: {0}")]
    Schema(#[source] StoreError),

    #[error("table has no column {0:?}")]
    UnknownColumn(String),

    #[error("no writable columns")]
    NoWritableColumns,

    #[error("value count mismatch: {expected} columns, {got} values")]
    ArityMismatch { expected: usize, got: usize },

    #[error("insert failed: {0}")]
    Execute(#[source] StoreError),
}

impl ExecutionError {
    /// Short label used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema(_) => "schema",
            Self::UnknownColumn(_) => "unknown_column",
            Self::NoWritableColumns => "no_columns",
            Self::ArityMismatch { .. } => "arity",
            Self::Execute(_) => "execute",
        }
    }
}

/// One asynchronous write destined for a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    table: String,
    columns: Vec<String>,
    values: Vec<String>,
}

/// A parameterized insert ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    pub sql: String,
    pub args: Vec<String>,
}

impl Job {
    /// Build a job. An empty `columns` list means "every non-timestamp
    /// column, in schema order".
    pub fn new(
        table: impl Into<String>,
        columns: Vec<String>,
        values: Vec<String>,
    ) -> Result<Self, JobError> {
        let table = table.into();
        if table.is_empty() {
            return Err(JobError::MissingTable);
        }
        if values.is_empty() {
            return Err(JobError::MissingValues);
        }
        if !columns.is_empty() && columns.len() != values.len() {
            return Err(JobError::ArityMismatch {
                columns: columns.len(),
                values: values.len(),
            });
        }
        for name in std::iter::once(&table).chain(&columns) {
            validate_identifier(name).map_err(|_| JobError::InvalidIdentifier(name.clone()))?;
        }

        Ok(Self {
            table,
            columns,
            values,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Resolve this job against the table's live column list.
    ///
    /// The timestamp column is always left to the store's default: it is
    /// dropped from the writable set, and a caller-supplied timestamp column is
    /// dropped together with its positional value.
    pub fn plan_insert(&self, table_columns: &[String]) -> Result<InsertPlan, ExecutionError> {
        let writable: Vec<&String> = table_columns
            .iter()
            .filter(|c| !is_timestamp_column(c))
            .collect();

        let (columns, args): (Vec<&String>, Vec<String>) = if self.columns.is_empty() {
            (writable, self.values.clone())
        } else {
            let mut columns = Vec::with_capacity(self.columns.len());
            let mut args = Vec::with_capacity(self.values.len());
            for (column, value) in self.columns.iter().zip(&self.values) {
                if is_timestamp_column(column) {
                    continue;
                }
                let resolved = writable
                    .iter()
                    .find(|c| c.eq_ignore_ascii_case(column))
                    .ok_or_else(|| ExecutionError::UnknownColumn(column.clone()))?;
                columns.push(*resolved);
                args.push(value.clone());
            }
            (columns, args)
        };

        if columns.is_empty() {
            return Err(ExecutionError::NoWritableColumns);
        }
        if columns.len() != args.len() {
            return Err(ExecutionError::ArityMismatch {
                expected: columns.len(),
                got: args.len(),
            });
        }

        let column_list = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        Ok(InsertPlan {
            sql: format!(
                "INSERT INTO {} ({column_list}) VALUES ({placeholders})",
                quote_identifier(&self.table)
            ),
            args,
        })
    }

    /// Look up the schema, plan, and run the insert. Caller holds the write lock.
    pub fn execute<S: Store + ?Sized>(&self, store: &mut S) -> Result<usize, ExecutionError> {
        let table_columns = store.columns(&self.table).map_err(ExecutionError::Schema)?;
        let plan = self.plan_insert(&table_columns)?;
        store
            .execute(&plan.sql, &plan.args)
            .map_err(ExecutionError::Execute)
    }
}
