//! Row statements: INSERT, UPDATE, DELETE.

use crate::{IdentError, Value, validate_ident};

/// A row statement that can't be rendered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StmtError {
    #[error(transparent)]
    Ident(#[from] IdentError),

    #[error("row {row} has {got} values for {expected} columns")]
    RowArity {
        row: usize,
        expected: usize,
        got: usize,
    },
}

/// An equality condition in a WHERE clause.
///
/// `Value::Null` renders as `IS NULL`, everything else as `=`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub value: Value,
}

impl Condition {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    fn render(&self) -> Result<String, IdentError> {
        let column = validate_ident(&self.column)?;
        Ok(if self.value.is_null() {
            format!("{} IS NULL", column)
        } else {
            format!("{} = {}", column, self.value.to_sql_literal())
        })
    }
}

fn render_where(conditions: &[Condition]) -> Result<String, IdentError> {
    if conditions.is_empty() {
        return Ok(String::new());
    }
    let parts = conditions
        .iter()
        .map(Condition::render)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!(" WHERE {}", parts.join(" AND ")))
}

/// A multi-row INSERT statement.
#[derive(Debug, Clone, Default)]
pub struct InsertStmt {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl InsertStmt {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn columns(mut self, cols: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns.extend(cols.into_iter().map(Into::into));
        self
    }

    pub fn row(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.rows.push(values.into_iter().collect());
        self
    }

    /// Render to SQL.
    ///
    /// Returns `Ok(None)` when there are no rows to insert. Every row must
    /// have exactly one value per column.
    pub fn render(&self) -> Result<Option<String>, StmtError> {
        if self.rows.is_empty() {
            return Ok(None);
        }

        let table = validate_ident(&self.table)?;
        let columns = self
            .columns
            .iter()
            .map(|c| validate_ident(c))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(StmtError::RowArity {
                    row: i,
                    expected: columns.len(),
                    got: row.len(),
                });
            }
            let values: Vec<String> = row.iter().map(Value::to_sql_literal).collect();
            rows.push(format!("({})", values.join(", ")));
        }

        Ok(Some(format!(
            "INSERT INTO {} ({}) VALUES {}",
            table,
            columns.join(", "),
            rows.join(", ")
        )))
    }
}

/// An UPDATE statement.
#[derive(Debug, Clone, Default)]
pub struct UpdateStmt {
    pub table: String,
    pub assignments: Vec<(String, Value)>,
    pub conditions: Vec<Condition>,
}

impl UpdateStmt {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    pub fn and_where(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Render to SQL. Returns `Ok(None)` when there is nothing to set.
    pub fn render(&self) -> Result<Option<String>, IdentError> {
        if self.assignments.is_empty() {
            return Ok(None);
        }

        let table = validate_ident(&self.table)?;
        let sets = self
            .assignments
            .iter()
            .map(|(col, value)| {
                validate_ident(col).map(|col| format!("{} = {}", col, value.to_sql_literal()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(format!(
            "UPDATE {} SET {}{}",
            table,
            sets.join(", "),
            render_where(&self.conditions)?
        )))
    }
}

/// A DELETE statement.
#[derive(Debug, Clone, Default)]
pub struct DeleteStmt {
    pub table: String,
    pub conditions: Vec<Condition>,
}

impl DeleteStmt {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    pub fn and_where(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn render(&self) -> Result<String, IdentError> {
        let table = validate_ident(&self.table)?;
        Ok(format!(
            "DELETE FROM {}{}",
            table,
            render_where(&self.conditions)?
        ))
    }
}
