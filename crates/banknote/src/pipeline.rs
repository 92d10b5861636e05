//! Scoring: read records, derive features, predict, write predictions.
//!
//! Training and model persistence happen elsewhere; a trained model is
//! anything implementing [`Classifier`].

use crate::error::{Error, Result};
use crate::features::{BanknoteRecord, FeatureRow, add_unique_key};
use crate::warehouse::{Warehouse, WarehouseExt};
use banknote_sql::{InsertStmt, Value};
use tracing::info;

/// A trained binary classifier.
pub trait Classifier {
    /// One label per input row, in input order.
    fn predict(&self, rows: &[FeatureRow]) -> Vec<i64>;
}

impl<F> Classifier for F
where
    F: Fn(&FeatureRow) -> i64,
{
    fn predict(&self, rows: &[FeatureRow]) -> Vec<i64> {
        rows.iter().map(self).collect()
    }
}

/// Columns written to the predictions table, in order.
pub const PREDICTION_COLUMNS: [&str; 10] = [
    "uniq_key",
    "variance",
    "skewness",
    "curtosis",
    "entropy",
    "product_feature",
    "sum_feature",
    "ratio_feature",
    "complex_feature",
    "prediction",
];

/// Score every row of `source` and append the results to `target`.
///
/// Returns the number of rows written. The target table must already match
/// [`models::predictions`](crate::models::predictions).
pub async fn score_table<W, C>(warehouse: &W, model: &C, source: &str, target: &str) -> Result<usize>
where
    W: Warehouse,
    C: Classifier + ?Sized,
{
    let rows = warehouse.read_table(source).await?;
    let records = BanknoteRecord::read_all(&rows)?;
    if records.is_empty() {
        info!(source, "nothing to score");
        return Ok(0);
    }

    let keyed = add_unique_key(records);
    let features: Vec<FeatureRow> = keyed
        .iter()
        .map(|k| FeatureRow::from_record(&k.record))
        .collect();

    let labels = model.predict(&features);
    if labels.len() != features.len() {
        return Err(Error::Prediction {
            expected: features.len(),
            got: labels.len(),
        });
    }

    let mut insert = InsertStmt::new(target).columns(PREDICTION_COLUMNS);
    for ((k, f), label) in keyed.iter().zip(&features).zip(&labels) {
        let mut row = Vec::with_capacity(PREDICTION_COLUMNS.len());
        row.push(Value::Text(k.uniq_key.clone()));
        row.extend(f.to_array().map(Value::Float));
        row.push(Value::Integer(*label));
        insert = insert.row(row);
    }

    warehouse.insert(&insert).await?;
    info!(source, target, rows = features.len(), "scored records");
    Ok(features.len())
}
