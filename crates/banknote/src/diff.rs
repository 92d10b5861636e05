//! Schema diffing - compare a declared table against the warehouse's copy.
//!
//! The diff is computed once against a single snapshot of the current
//! schema and has three phases, always in this order:
//!
//! 1. **Additions**: desired columns missing from the warehouse, in
//!    declaration order.
//! 2. **Drops**: warehouse columns that are no longer declared, in catalog
//!    order.
//! 3. **Modifications**: columns present on both sides whose type or default
//!    differ, in declaration order.
//!
//! A current schema with no columns means the table does not exist. The
//! diff is then a single `CREATE TABLE` and nothing else.

use crate::ddl::{DdlOperation, Phase};
use crate::schema::{ColumnSpec, TableSchema, specs_equal};
use banknote_sql::IdentError;

/// Changes needed to move one table from its current to its desired shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    /// Table name.
    pub table: String,
    /// Set when the table does not exist yet.
    pub create: Option<TableSchema>,
    pub additions: Vec<ColumnSpec>,
    pub drops: Vec<String>,
    /// Desired specs of columns whose definition changed.
    pub modifications: Vec<ColumnSpec>,
}

impl SchemaDiff {
    /// Diff `desired` against `current`.
    ///
    /// Both schemas are expected to be normalized; column identity is the
    /// exact (lower-case) name.
    pub fn between(desired: &TableSchema, current: &TableSchema) -> Self {
        let mut diff = SchemaDiff {
            table: desired.name.clone(),
            ..Default::default()
        };

        if current.is_empty() {
            diff.create = Some(desired.clone());
            return diff;
        }

        for col in desired.columns() {
            if !current.contains(&col.name) {
                diff.additions.push(col.clone());
            }
        }

        for col in current.columns() {
            if !desired.contains(&col.name) {
                diff.drops.push(col.name.clone());
            }
        }

        for desired_col in desired.columns() {
            if let Some(current_col) = current.get(&desired_col.name) {
                if !specs_equal(desired_col, current_col) {
                    diff.modifications.push(desired_col.clone());
                }
            }
        }

        diff
    }

    /// Returns true if there are no differences.
    pub fn is_empty(&self) -> bool {
        self.create.is_none()
            && self.additions.is_empty()
            && self.drops.is_empty()
            && self.modifications.is_empty()
    }

    /// Count total number of operations.
    pub fn change_count(&self) -> usize {
        usize::from(self.create.is_some())
            + self.additions.len()
            + self.drops.len()
            + self.modifications.len()
    }

    /// Number of operations in one phase.
    pub fn phase_len(&self, phase: Phase) -> usize {
        match phase {
            Phase::Create => usize::from(self.create.is_some()),
            Phase::Addition => self.additions.len(),
            Phase::Drop => self.drops.len(),
            Phase::Modification => self.modifications.len(),
        }
    }

    /// All operations, in execution order.
    pub fn operations(&self) -> Vec<DdlOperation> {
        let mut ops = Vec::with_capacity(self.change_count());

        if let Some(table) = &self.create {
            ops.push(DdlOperation::CreateTable(table.clone()));
        }
        ops.extend(self.additions.iter().map(|column| DdlOperation::AddColumn {
            table: self.table.clone(),
            column: column.clone(),
        }));
        ops.extend(self.drops.iter().map(|column| DdlOperation::DropColumn {
            table: self.table.clone(),
            column: column.clone(),
        }));
        ops.extend(
            self.modifications
                .iter()
                .map(|column| DdlOperation::ModifyColumn {
                    table: self.table.clone(),
                    column: column.clone(),
                }),
        );

        ops
    }

    /// Generate SQL statements for all changes, one per line.
    pub fn to_sql(&self) -> Result<String, IdentError> {
        let mut sql = String::new();
        for op in self.operations() {
            for stmt in op.statements()? {
                sql.push_str(&stmt);
                sql.push_str(";\n");
            }
        }
        Ok(sql)
    }
}

impl std::fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            writeln!(f, "{}: no changes", self.table)?;
        } else {
            writeln!(f, "{}:", self.table)?;
            for op in self.operations() {
                writeln!(f, "  {}", op)?;
            }
        }
        Ok(())
    }
}
