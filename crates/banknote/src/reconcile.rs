//! Reconcile a declared table with the warehouse.
//!
//! [`Reconciler::reconcile`] normalizes the declaration, reads the current
//! columns from the warehouse catalog once, diffs the two (see
//! [`SchemaDiff`]) and executes the resulting operations one by one.
//!
//! Nothing is rolled back. If a statement fails, every operation before it
//! stays applied and the returned [`DdlExecutionError`] lists them.

use crate::ddl::{DdlOperation, Phase};
use crate::diff::SchemaDiff;
use crate::schema::{ColumnSpec, SchemaError, TableSchema, check_table_name, normalize_default};
use crate::warehouse::{Warehouse, WarehouseError};
use banknote_sql::Value;
use tracing::{debug, info};

/// Why a reconciliation stopped.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The declaration was rejected before any query ran.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The warehouse connection could not be used; nothing was changed.
    #[error("warehouse unavailable: {0}")]
    Connection(#[source] WarehouseError),

    /// The catalog query failed; nothing was changed.
    #[error("catalog query failed: {sql}: {source}")]
    Query {
        sql: String,
        #[source]
        source: WarehouseError,
    },

    /// A DDL statement failed part way through the run.
    #[error(transparent)]
    Ddl(#[from] Box<DdlExecutionError>),
}

impl ReconcileError {
    /// Operations that were applied before the failure. Empty unless a DDL
    /// statement failed.
    pub fn applied(&self) -> &[DdlOperation] {
        match self {
            ReconcileError::Ddl(e) => &e.applied,
            _ => &[],
        }
    }
}

/// A DDL statement failed. Earlier operations remain applied.
#[derive(Debug, thiserror::Error)]
#[error(
    "failed to {} ({} of {} {} completed): {}: {}",
    .operation.describe(),
    .index,
    .phase_total,
    .phase.plural(),
    .statement,
    .source
)]
pub struct DdlExecutionError {
    /// The operation that failed.
    pub operation: DdlOperation,
    /// The statement that failed. For a column modification this may be the
    /// second statement, in which case the type change already went through.
    pub statement: String,
    pub phase: Phase,
    /// Zero-based position of the failed operation within its phase, which
    /// is also the number of operations of that phase that completed.
    pub index: usize,
    /// Number of operations the phase would have run.
    pub phase_total: usize,
    /// Every operation that completed before the failure, in order.
    pub applied: Vec<DdlOperation>,
    #[source]
    pub source: WarehouseError,
}

/// Brings warehouse tables in line with their declarations.
///
/// Holds a borrowed warehouse; connection lifecycle is the caller's.
/// Reconciliations are not guarded against each other: run one at a time
/// per table.
pub struct Reconciler<'w, W: Warehouse> {
    warehouse: &'w W,
}

impl<'w, W: Warehouse> Reconciler<'w, W> {
    pub fn new(warehouse: &'w W) -> Self {
        Self { warehouse }
    }

    /// Read a table's columns from the warehouse catalog.
    ///
    /// Names come back lower-cased, types and defaults upper-cased. A
    /// missing table yields a schema with no columns.
    pub async fn fetch_current_schema(&self, table: &str) -> Result<TableSchema, ReconcileError> {
        check_table_name(table)?;

        let sql = self.warehouse.catalog_query(table);
        let rows = self.warehouse.query(&sql).await.map_err(|source| {
            if source.is_connection() {
                ReconcileError::Connection(source)
            } else {
                ReconcileError::Query {
                    sql: sql.clone(),
                    source,
                }
            }
        })?;

        let mut schema = TableSchema::new(table);
        for row in rows.iter() {
            let spec = match catalog_column(row) {
                Ok(spec) => spec,
                Err(reason) => return Err(bad_catalog_row(sql, reason)),
            };
            // Quoted names like "A" and a fold together; one would shadow
            // the other.
            if schema.contains(&spec.name) {
                let reason = format!("column {} appears twice after lower-casing", spec.name);
                return Err(bad_catalog_row(sql, reason));
            }
            schema.push(spec);
        }

        Ok(schema)
    }

    /// Compute what [`reconcile`](Self::reconcile) would do, without
    /// executing anything.
    pub async fn plan(&self, desired: &TableSchema) -> Result<SchemaDiff, ReconcileError> {
        let desired = desired.normalize()?;
        let current = self.fetch_current_schema(&desired.name).await?;
        debug!(table = %desired.name, current = ?current, desired = ?desired, "comparing schemas");
        Ok(SchemaDiff::between(&desired, &current))
    }

    /// Bring the warehouse table in line with `desired`.
    ///
    /// Creates the table if it does not exist; otherwise adds missing
    /// columns, drops undeclared ones, then modifies changed ones, executing
    /// each operation as soon as the previous one completes. Returns the
    /// operations applied, which is empty when the table already matches.
    pub async fn reconcile(
        &self,
        desired: &TableSchema,
    ) -> Result<Vec<DdlOperation>, ReconcileError> {
        let diff = self.plan(desired).await?;
        if diff.is_empty() {
            info!(table = %diff.table, "table is up to date");
            return Ok(Vec::new());
        }

        // Render everything up front so an unsafe name in the catalog stops
        // the run before the first statement.
        let mut steps = Vec::with_capacity(diff.change_count());
        for op in diff.operations() {
            let statements = op.statements().map_err(SchemaError::from)?;
            steps.push((op, statements));
        }

        if diff.create.is_some() {
            info!(table = %diff.table, "table does not exist, creating it");
        }

        let mut applied = Vec::with_capacity(steps.len());
        let mut phase_index = 0;
        let mut current_phase = None;

        for (op, statements) in steps {
            let phase = op.phase();
            if current_phase != Some(phase) {
                current_phase = Some(phase);
                phase_index = 0;
            }

            for statement in statements {
                info!(sql = %statement, "executing");
                if let Err(source) = self.warehouse.execute(&statement).await {
                    return Err(Box::new(DdlExecutionError {
                        phase_total: diff.phase_len(phase),
                        operation: op,
                        statement,
                        phase,
                        index: phase_index,
                        applied,
                        source,
                    })
                    .into());
                }
            }

            info!(table = %op.table(), "{}", completed_message(&op));
            applied.push(op);
            phase_index += 1;
        }

        Ok(applied)
    }
}

fn bad_catalog_row(sql: String, reason: String) -> ReconcileError {
    ReconcileError::Query {
        sql,
        source: WarehouseError::Decode {
            column: "COLUMN_NAME".to_owned(),
            reason,
        },
    }
}

fn completed_message(op: &DdlOperation) -> String {
    match op {
        DdlOperation::CreateTable(t) => format!("created table {}", t.name),
        DdlOperation::AddColumn { column, .. } => format!("added column {}", column.name),
        DdlOperation::DropColumn { column, .. } => format!("dropped column {}", column),
        DdlOperation::ModifyColumn { column, .. } => format!("modified column {}", column.name),
    }
}

/// Build a column spec from a `(column_name, data_type, column_default)`
/// catalog row.
fn catalog_column(row: &[Value]) -> Result<ColumnSpec, String> {
    let [name, data_type, default, ..] = row else {
        return Err(format!("expected 3 catalog columns, got {}", row.len()));
    };

    if name.is_null() {
        return Err("column name is NULL".to_owned());
    }

    let data_type = if data_type.is_null() {
        String::new()
    } else {
        data_type.to_string().to_uppercase()
    };

    // SQL NULL means no default; anything else is stringified.
    let default = if default.is_null() {
        None
    } else {
        normalize_default(Some(default.to_string().as_str()))
    };

    Ok(ColumnSpec {
        name: name.to_string().to_lowercase(),
        data_type,
        default,
    })
}
