//! Warehouse schema reconciliation for the banknote authentication pipeline.
//!
//! This crate provides:
//! - Declared table schemas and their normalization ([`TableSchema`])
//! - Diffing a declaration against the live warehouse catalog ([`SchemaDiff`])
//! - Executing the resulting DDL, with partial-failure reporting ([`Reconciler`])
//! - The scoring pipeline that feeds the predictions table ([`score_table`])
//!
//! # Reconciling
//!
//! ```ignore
//! let config = WarehouseConfig::from_env()?;
//! let warehouse = PgWarehouse::connect(&config)?;
//! let applied = Reconciler::new(&warehouse)
//!     .reconcile(&models::original_data())
//!     .await?;
//! ```
//!
//! The table is created if it does not exist. Otherwise missing columns are
//! added, undeclared columns dropped and changed columns modified, in that
//! order. Nothing is rolled back: a failure reports what was applied.
//!
//! # Naming
//!
//! Column names compare case-insensitively and are stored lower-cased. Types
//! and defaults are compared upper-cased, exactly; `INT` and `INTEGER` are
//! different types as far as reconciliation is concerned.

pub mod config;
mod ddl;
mod diff;
mod error;
pub mod features;
pub mod models;
mod pipeline;
mod postgres;
mod reconcile;
mod schema;
mod warehouse;

pub use config::{ConfigError, WarehouseConfig};
pub use ddl::{DdlOperation, Phase};
pub use diff::SchemaDiff;
pub use error::{Error, Result};
pub use features::RecordError;
pub use pipeline::{Classifier, PREDICTION_COLUMNS, score_table};
pub use postgres::PgWarehouse;
pub use reconcile::{DdlExecutionError, ReconcileError, Reconciler};
pub use schema::{ColumnSpec, SchemaError, TableSchema, specs_equal};
pub use warehouse::{Rows, Warehouse, WarehouseError, WarehouseExt, catalog_query};

pub use banknote_sql::Value;
