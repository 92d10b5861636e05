//! Postgres warehouse.
//!
//! Wraps a `deadpool_postgres` pool and logs every statement via tracing.

use crate::config::WarehouseConfig;
use crate::warehouse::{Rows, Warehouse, WarehouseError};
use banknote_sql::{Lit, Value};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tokio_postgres::types::Type;
use tokio_postgres::{Column, NoTls, Row};
use tracing::Instrument;

/// A warehouse backed by Postgres.
///
/// # Example
///
/// ```ignore
/// use banknote::{PgWarehouse, Reconciler, WarehouseConfig};
///
/// let config = WarehouseConfig::from_env()?;
/// let warehouse = PgWarehouse::connect(&config)?;
/// Reconciler::new(&warehouse).reconcile(&banknote::models::original_data()).await?;
/// ```
#[derive(Clone, Debug)]
pub struct PgWarehouse {
    pool: Pool,
    catalog_schema: Option<String>,
}

impl PgWarehouse {
    /// Build the connection pool. No connection is opened until the first
    /// statement runs.
    pub fn connect(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        let pg_config: tokio_postgres::Config = config
            .database_url
            .parse()
            .map_err(|e: tokio_postgres::Error| WarehouseError::Connect(e.to_string()))?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .build()
            .map_err(|e| WarehouseError::Connect(e.to_string()))?;

        Ok(Self {
            pool,
            catalog_schema: config.catalog_schema.clone(),
        })
    }
}

impl Warehouse for PgWarehouse {
    async fn query(&self, sql: &str) -> Result<Rows, WarehouseError> {
        let span = tracing::debug_span!("db.query", sql = %sql, rows = tracing::field::Empty);
        let client = self.pool.get().await?;
        // Prepare first so an empty result still knows its columns.
        let (statement, raw) = async {
            let statement = client.prepare(sql).await?;
            let raw = client.query(&statement, &[]).await?;
            Ok::<_, tokio_postgres::Error>((statement, raw))
        }
        .instrument(span.clone())
        .await?;
        span.record("rows", raw.len());
        decode_rows(statement.columns(), &raw)
    }

    async fn execute(&self, sql: &str) -> Result<u64, WarehouseError> {
        let span = tracing::debug_span!(
            "db.execute",
            sql = %sql,
            affected = tracing::field::Empty,
        );
        let client = self.pool.get().await?;
        let affected = client.execute(sql, &[]).instrument(span.clone()).await?;
        span.record("affected", affected);
        Ok(affected)
    }

    /// Postgres folds unquoted identifiers to lower case and exposes the
    /// catalog columns as domain types, so the lookup compares upper-cased
    /// names and casts the result columns to text. Columns come back in
    /// ordinal order.
    fn catalog_query(&self, table: &str) -> String {
        let schema_filter = match &self.catalog_schema {
            Some(schema) => format!(" AND TABLE_SCHEMA = {}", Lit(schema)),
            None => " AND TABLE_SCHEMA = current_schema()".to_owned(),
        };
        format!(
            "SELECT COLUMN_NAME::text, DATA_TYPE::text, COLUMN_DEFAULT::text \
             FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE UPPER(TABLE_NAME) = {}{} \
             ORDER BY ORDINAL_POSITION",
            Lit(table.to_uppercase()),
            schema_filter
        )
    }
}

fn decode_rows(columns: &[Column], raw: &[Row]) -> Result<Rows, WarehouseError> {
    let mut rows = Rows::new(columns.iter().map(|c| c.name()));
    for row in raw {
        let values = (0..row.len())
            .map(|idx| decode_value(row, idx))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }
    Ok(rows)
}

fn decode_value(row: &Row, idx: usize) -> Result<Value, WarehouseError> {
    let column = &row.columns()[idx];
    let value = match *column.type_() {
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(|v| Value::Integer(v.into())),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(|v| Value::Integer(v.into())),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::Integer),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(|v| Value::Float(v.into())),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        Type::NUMERIC => match row.try_get::<_, Option<Decimal>>(idx)? {
            Some(d) if d.fract().is_zero() => d.to_i64().map(Value::Integer),
            Some(d) => d.to_f64().map(Value::Float),
            None => None,
        },
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)?
            .map(|v| Value::Integer(v.into())),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(idx)?.map(Value::Text)
        }
        ref other => {
            return Err(WarehouseError::Decode {
                column: column.name().to_owned(),
                reason: format!("unsupported type {}", other),
            });
        }
    };
    Ok(value.unwrap_or(Value::Null))
}
