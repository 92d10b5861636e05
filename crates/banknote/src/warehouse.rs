//! The warehouse seam.
//!
//! Everything that talks to the warehouse goes through [`Warehouse`]:
//! raw SQL in, rows out. [`PgWarehouse`](crate::PgWarehouse) is the Postgres
//! implementation; tests use an in-memory one.

use banknote_sql::{
    DeleteStmt, IdentError, InsertStmt, Lit, StmtError, UpdateStmt, Value, validate_ident,
};
use std::future::Future;

/// Errors from the warehouse collaborator.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("failed to connect to warehouse: {0}")]
    Connect(String),

    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("postgres error: {}", postgres_message(.0))]
    Postgres(#[from] tokio_postgres::Error),

    #[error("cannot decode column {column}: {reason}")]
    Decode { column: String, reason: String },

    #[error("invalid identifier: {0}")]
    Ident(#[from] IdentError),

    #[error("invalid statement: {0}")]
    Statement(#[from] StmtError),

    #[error("statement rejected: {0}")]
    Rejected(String),
}

impl WarehouseError {
    /// True when the connection itself is unusable, as opposed to a single
    /// statement failing.
    pub fn is_connection(&self) -> bool {
        match self {
            WarehouseError::Connect(_) | WarehouseError::Pool(_) => true,
            WarehouseError::Postgres(e) => e.is_closed(),
            _ => false,
        }
    }
}

/// The server's own message when there is one; `tokio_postgres::Error`
/// alone only says `db error`.
fn postgres_message(e: &tokio_postgres::Error) -> String {
    match e.as_db_error() {
        Some(db) => format!("{} ({})", db.message(), db.code().code()),
        None => e.to_string(),
    }
}

/// Rows returned by a query, with their column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Rows {
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Catalog query for a table's columns, in the shape
/// `SELECT COLUMN_NAME, DATA_TYPE, COLUMN_DEFAULT ... WHERE TABLE_NAME = '<TABLE>'`.
///
/// The table name is upper-cased; it must already have passed the
/// identifier allow-list.
pub fn catalog_query(table: &str) -> String {
    format!(
        "SELECT COLUMN_NAME, DATA_TYPE, COLUMN_DEFAULT \
         FROM INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_NAME = {}",
        Lit(table.to_uppercase())
    )
}

/// A connected warehouse that can run SQL.
///
/// Calls are awaited one at a time by every caller in this crate; an
/// implementation never sees two statements in flight from the same
/// reconciliation.
pub trait Warehouse: Send + Sync {
    /// Run a query and return its rows.
    fn query(&self, sql: &str) -> impl Future<Output = Result<Rows, WarehouseError>> + Send;

    /// Run a statement, returning the number of rows affected.
    fn execute(&self, sql: &str) -> impl Future<Output = Result<u64, WarehouseError>> + Send;

    /// The catalog query used to introspect `table`.
    ///
    /// Must return rows of `(column_name, data_type, column_default)`.
    fn catalog_query(&self, table: &str) -> String {
        catalog_query(table)
    }
}

/// Table-level helpers on top of [`Warehouse`].
pub trait WarehouseExt: Warehouse + Sized {
    /// Read every row of a table.
    fn read_table(&self, table: &str) -> impl Future<Output = Result<Rows, WarehouseError>> + Send {
        async move {
            let table = validate_ident(table)?;
            self.query(&format!("SELECT * FROM {}", table)).await
        }
    }

    /// Run an INSERT. Returns 0 without touching the warehouse when there
    /// are no rows.
    fn insert(&self, stmt: &InsertStmt) -> impl Future<Output = Result<u64, WarehouseError>> + Send {
        async move {
            match stmt.render()? {
                Some(sql) => self.execute(&sql).await,
                None => Ok(0),
            }
        }
    }

    /// Run an UPDATE. Returns 0 without touching the warehouse when there is
    /// nothing to set.
    fn update(&self, stmt: &UpdateStmt) -> impl Future<Output = Result<u64, WarehouseError>> + Send {
        async move {
            match stmt.render()? {
                Some(sql) => self.execute(&sql).await,
                None => Ok(0),
            }
        }
    }

    /// Run a DELETE.
    fn delete(&self, stmt: &DeleteStmt) -> impl Future<Output = Result<u64, WarehouseError>> + Send {
        async move {
            let sql = stmt.render()?;
            self.execute(&sql).await
        }
    }
}

impl<W: Warehouse> WarehouseExt for W {}
