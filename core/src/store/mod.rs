//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Sections and verifiers call store methods; the query catalog only
//! produces text that the store executes.

use crate::{
    error::LoanResult,
    result_set::{Cell, ResultSet},
};
mod dataset;
mod derived;
use rusqlite::{params, Batch, Connection, OptionalExtension, Statement};

pub struct LoanStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl LoanStore {
    pub fn open(path: &str) -> LoanResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // No WAL: a section reset copies a single database file.
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> LoanResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Create the five base tables and seed `months`. Idempotent.
    pub fn migrate(&self) -> LoanResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_loan_schema.sql"))?;
        Ok(())
    }

    // ── Statement batches ─────────────────────────────────────────

    /// Execute a semicolon-delimited batch one statement at a time.
    ///
    /// Statements without result columns run for their side effect.
    /// Row-returning statements are collected; the last one is returned.
    /// Each statement is prepared only after the previous one ran, so a
    /// batch may read tables it created earlier.
    pub fn run_batch(&self, sql: &str) -> LoanResult<Option<ResultSet>> {
        let mut batch = Batch::new(&self.conn, sql);
        let mut last = None;
        while let Some(mut stmt) = batch.next()? {
            if stmt.column_count() == 0 {
                let changed = stmt.execute([])?;
                log::debug!("statement ok, {changed} row(s) changed");
            } else {
                let rs = collect_rows(&mut stmt)?;
                log::debug!("statement returned {} row(s)", rs.len());
                last = Some(rs);
            }
        }
        Ok(last)
    }

    pub fn table_exists(&self, name: &str) -> LoanResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn column_names(&self, table: &str) -> LoanResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let names = stmt
            .query_map(params![table], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn row_count(&self, table: &str) -> LoanResult<i64> {
        // Table names cannot be bound; only accept plain identifiers.
        if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(anyhow::anyhow!("Invalid table name '{table}'").into());
        }
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }
}

fn collect_rows(stmt: &mut Statement<'_>) -> LoanResult<ResultSet> {
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let width = columns.len();
    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(Cell::from(row.get_ref(i)?));
        }
        rows.push(cells);
    }
    Ok(ResultSet { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_seeds_twelve_months() {
        let store = LoanStore::in_memory().unwrap();
        store.migrate().unwrap();
        store.migrate().unwrap();
        assert_eq!(store.row_count("months").unwrap(), 12);
    }

    #[test]
    fn batch_returns_last_result_set() {
        let store = LoanStore::in_memory().unwrap();
        let rs = store
            .run_batch(
                "CREATE TABLE t (x INTEGER);
                 INSERT INTO t VALUES (1), (2);
                 SELECT 'ignored' AS y;
                 SELECT SUM(x) AS Total FROM t;",
            )
            .unwrap()
            .unwrap();
        assert_eq!(rs.columns, vec!["Total".to_string()]);
        assert_eq!(rs.rows, vec![vec![Cell::Integer(3)]]);
    }

    #[test]
    fn side_effect_only_batch_returns_none() {
        let store = LoanStore::in_memory().unwrap();
        let out = store
            .run_batch("DROP TABLE IF EXISTS t; CREATE TABLE t (x INTEGER);")
            .unwrap();
        assert!(out.is_none());
        assert!(store.table_exists("t").unwrap());
        assert_eq!(store.column_names("t").unwrap(), vec!["x".to_string()]);
    }

    #[test]
    fn missing_table_surfaces_engine_error() {
        let store = LoanStore::in_memory().unwrap();
        let err = store.run_batch("SELECT * FROM corrected_customers;");
        assert!(err.is_err());
    }

    #[test]
    fn row_count_rejects_odd_identifiers() {
        let store = LoanStore::in_memory().unwrap();
        assert!(store.row_count("months; DROP TABLE x").is_err());
    }
}
