//! Schema helpers: pragmas, identifier validation and managed-table DDL.
//!
//! Every managed table carries a leading `date` column defaulting to
//! `CURRENT_TIMESTAMP`. Callers never write it; the retention sweep keys on it.

use rusqlite::Connection;
use std::time::Duration;
use thiserror::Error;

/// Name of the store-maintained timestamp column present on every managed table.
pub const TIMESTAMP_COLUMN: &str = "date";

/// Busy timeout applied to every connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("invalid column definition: {0:?}")]
    InvalidColumnDefinition(String),

    #[error("table {0:?} needs at least one column")]
    NoColumns(String),

    #[error("column {0:?} is managed by the store")]
    ReservedColumn(String),
}

/// Apply write-connection pragmas.
///
/// WAL lets the reader pool query while the worker writes.
pub fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

/// Apply read-connection pragmas.
pub fn apply_reader_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

/// Check that `name` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn validate_identifier(name: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(name.to_string()))
    }
}

/// Quote an identifier for interpolation into a statement.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// True if `column` is the store-maintained timestamp column.
pub fn is_timestamp_column(column: &str) -> bool {
    column.eq_ignore_ascii_case(TIMESTAMP_COLUMN)
}

/// A validated `name [TYPE ...]` column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub type_words: Vec<String>,
}

impl ColumnDef {
    /// Parse a definition such as `URL TEXT` or `score INTEGER NOT NULL`.
    ///
    /// Type words are restricted to alphanumerics so a definition cannot
    /// smuggle in further SQL.
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let mut words = raw.split_whitespace();
        let name = words
            .next()
            .ok_or_else(|| SchemaError::InvalidColumnDefinition(raw.to_string()))?;
        validate_identifier(name)?;
        if is_timestamp_column(name) {
            return Err(SchemaError::ReservedColumn(name.to_string()));
        }

        let type_words: Vec<String> = words.map(str::to_string).collect();
        if type_words
            .iter()
            .any(|w| !w.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        {
            return Err(SchemaError::InvalidColumnDefinition(raw.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            type_words,
        })
    }

    fn to_sql(&self) -> String {
        let mut sql = quote_identifier(&self.name);
        for word in &self.type_words {
            sql.push(' ');
            sql.push_str(word);
        }
        sql
    }
}

/// Build the DDL for a managed table: the table itself, an index on the
/// timestamp column, and an index on the last user column.
pub fn create_table_statements(
    table: &str,
    columns: &[ColumnDef],
) -> Result<Vec<String>, SchemaError> {
    validate_identifier(table)?;
    let last = columns
        .last()
        .ok_or_else(|| SchemaError::NoColumns(table.to_string()))?;

    let mut defs = vec![format!(
        "{} DATETIME DEFAULT CURRENT_TIMESTAMP",
        quote_identifier(TIMESTAMP_COLUMN)
    )];
    defs.extend(columns.iter().map(ColumnDef::to_sql));

    let quoted = quote_identifier(table);
    Ok(vec![
        format!("CREATE TABLE IF NOT EXISTS {quoted} ({})", defs.join(", ")),
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {quoted} ({})",
            quote_identifier(&format!("idx_{table}_{TIMESTAMP_COLUMN}")),
            quote_identifier(TIMESTAMP_COLUMN)
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {quoted} ({})",
            quote_identifier(&format!("idx_{table}_{}", last.name)),
            quote_identifier(&last.name)
        ),
    ])
}

/// Column names of `table` in declaration order (empty if it does not exist).
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare_cached("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let rows = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// User table names in lexicographic order, excluding SQLite internals.
pub fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("events").is_ok());
        assert!(validate_identifier("_private_2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("drop table;").is_err());
        assert!(validate_identifier("a-b").is_err());
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("plain"), "\"plain\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_column_def_parse() {
        let def = ColumnDef::parse("score INTEGER NOT NULL").unwrap();
        assert_eq!(def.name, "score");
        assert_eq!(def.type_words, vec!["INTEGER", "NOT", "NULL"]);

        assert!(ColumnDef::parse("url").unwrap().type_words.is_empty());
        assert!(ColumnDef::parse("").is_err());
        assert!(ColumnDef::parse("x TEXT); DROP TABLE y; --").is_err());
        assert_eq!(
            ColumnDef::parse("DATE TEXT"),
            Err(SchemaError::ReservedColumn("DATE".into()))
        );
    }

    #[test]
    fn test_create_table_statements() {
        let cols = vec![
            ColumnDef::parse("URL TEXT").unwrap(),
            ColumnDef::parse("sURL TEXT").unwrap(),
        ];
        let stmts = create_table_statements("url_shortener", &cols).unwrap();
        assert_eq!(stmts.len(), 3);
        assert_eq!(
            stmts[0],
            "CREATE TABLE IF NOT EXISTS \"url_shortener\" \
             (\"date\" DATETIME DEFAULT CURRENT_TIMESTAMP, \"URL\" TEXT, \"sURL\" TEXT)"
        );
        assert!(stmts[1].contains("\"idx_url_shortener_date\""));
        assert!(stmts[2].contains("\"idx_url_shortener_sURL\" ON \"url_shortener\" (\"sURL\")"));

        assert_eq!(
            create_table_statements("empty", &[]),
            Err(SchemaError::NoColumns("empty".into()))
        );
    }

    #[test]
    fn test_introspection() {
        let conn = Connection::open_in_memory().unwrap();
        let cols = vec![
            ColumnDef::parse("user TEXT").unwrap(),
            ColumnDef::parse("action TEXT").unwrap(),
        ];
        for stmt in create_table_statements("events", &cols).unwrap() {
            conn.execute(&stmt, []).unwrap();
        }

        assert_eq!(
            table_columns(&conn, "events").unwrap(),
            vec!["date", "user", "action"]
        );
        assert!(table_columns(&conn, "missing").unwrap().is_empty());
        assert_eq!(table_names(&conn).unwrap(), vec!["events"]);
    }
}
