//! DDL operations and their SQL.
//!
//! Operations are plain values. Executing them is the warehouse's job; see
//! [`Reconciler`](crate::Reconciler).

use crate::schema::{ColumnSpec, TableSchema};
use banknote_sql::{IdentError, validate_ident};

/// The phase an operation belongs to. Phases always run in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Create,
    Addition,
    Drop,
    Modification,
}

impl Phase {
    /// Plural label used in progress and error messages.
    pub fn plural(self) -> &'static str {
        match self {
            Phase::Create => "table creations",
            Phase::Addition => "additions",
            Phase::Drop => "drops",
            Phase::Modification => "modifications",
        }
    }
}

/// A single schema change against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlOperation {
    /// Create the table with every desired column, in declaration order.
    CreateTable(TableSchema),
    /// Add a column that only exists in the desired schema.
    AddColumn { table: String, column: ColumnSpec },
    /// Drop a column that only exists in the warehouse.
    DropColumn { table: String, column: String },
    /// Bring an existing column's type and default in line with `column`.
    ModifyColumn { table: String, column: ColumnSpec },
}

impl DdlOperation {
    pub fn phase(&self) -> Phase {
        match self {
            DdlOperation::CreateTable(_) => Phase::Create,
            DdlOperation::AddColumn { .. } => Phase::Addition,
            DdlOperation::DropColumn { .. } => Phase::Drop,
            DdlOperation::ModifyColumn { .. } => Phase::Modification,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            DdlOperation::CreateTable(t) => &t.name,
            DdlOperation::AddColumn { table, .. }
            | DdlOperation::DropColumn { table, .. }
            | DdlOperation::ModifyColumn { table, .. } => table,
        }
    }

    /// The column this operation touches; `None` for table creation.
    pub fn column(&self) -> Option<&str> {
        match self {
            DdlOperation::CreateTable(_) => None,
            DdlOperation::AddColumn { column, .. } | DdlOperation::ModifyColumn { column, .. } => {
                Some(&column.name)
            }
            DdlOperation::DropColumn { column, .. } => Some(column),
        }
    }

    /// SQL statements for this operation, in execution order.
    ///
    /// Every operation yields one statement except `ModifyColumn`, which
    /// always yields two: the type change, then `SET DEFAULT` or
    /// `DROP DEFAULT`, even when only one of type or default differs.
    pub fn statements(&self) -> Result<Vec<String>, IdentError> {
        let table = validate_ident(self.table())?;
        Ok(match self {
            DdlOperation::CreateTable(schema) => {
                let defs = schema
                    .columns()
                    .map(ColumnSpec::definition_sql)
                    .collect::<Result<Vec<_>, _>>()?;
                vec![format!("CREATE TABLE {} ({})", table, defs.join(", "))]
            }
            DdlOperation::AddColumn { column, .. } => {
                vec![format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    table,
                    column.definition_sql()?
                )]
            }
            DdlOperation::DropColumn { column, .. } => {
                let column = validate_ident(column)?;
                vec![format!("ALTER TABLE {} DROP COLUMN {}", table, column)]
            }
            DdlOperation::ModifyColumn { column, .. } => {
                let name = validate_ident(&column.name)?;
                let default = match &column.default {
                    Some(default) => format!(
                        "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
                        table, name, default
                    ),
                    None => format!("ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT", table, name),
                };
                vec![
                    format!(
                        "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
                        table, name, column.data_type
                    ),
                    default,
                ]
            }
        })
    }

    /// Short description for log lines and errors, e.g. `add column b to t`.
    pub fn describe(&self) -> String {
        match self {
            DdlOperation::CreateTable(t) => format!("create table {}", t.name),
            DdlOperation::AddColumn { table, column } => {
                format!("add column {} to {}", column.name, table)
            }
            DdlOperation::DropColumn { table, column } => {
                format!("drop column {} from {}", column, table)
            }
            DdlOperation::ModifyColumn { table, column } => {
                format!("modify column {} in {}", column.name, table)
            }
        }
    }
}

impl std::fmt::Display for DdlOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn spec(col: &ColumnSpec) -> String {
            match &col.default {
                Some(d) => format!("{} DEFAULT {}", col.data_type, d),
                None => col.data_type.clone(),
            }
        }

        match self {
            DdlOperation::CreateTable(t) => write!(f, "+ table {} ({} columns)", t.name, t.len()),
            DdlOperation::AddColumn { column, .. } => {
                write!(f, "+ {}: {}", column.name, spec(column))
            }
            DdlOperation::DropColumn { column, .. } => write!(f, "- {}", column),
            DdlOperation::ModifyColumn { column, .. } => {
                write!(f, "~ {}: {}", column.name, spec(column))
            }
        }
    }
}
