//! Declared warehouse tables.
//!
//! Types are spelled the way Postgres reports them in
//! `information_schema.columns.data_type`, since types compare exactly.

use crate::schema::{ColumnSpec, TableSchema};

/// Raw banknote measurements with their label.
pub const ORIGINAL_DATA: &str = "original_data";
/// Scored records.
pub const PREDICTIONS: &str = "bank_note_pred";

pub fn original_data() -> TableSchema {
    TableSchema::new(ORIGINAL_DATA)
        .column(ColumnSpec::new("variance", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("skewness", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("curtosis", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("entropy", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("class", "INTEGER"))
}

pub fn predictions() -> TableSchema {
    TableSchema::new(PREDICTIONS)
        .column(ColumnSpec::new("uniq_key", "CHARACTER VARYING"))
        .column(ColumnSpec::new("variance", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("skewness", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("curtosis", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("entropy", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("product_feature", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("sum_feature", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("ratio_feature", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("complex_feature", "DOUBLE PRECISION"))
        .column(ColumnSpec::new("prediction", "INTEGER"))
}

/// Every declared table, in migration order.
pub fn all() -> Vec<TableSchema> {
    vec![original_data(), predictions()]
}

/// Look up a declared table by name, case-insensitively.
pub fn by_name(name: &str) -> Option<TableSchema> {
    all()
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
}
