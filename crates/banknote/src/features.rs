//! Banknote records and derived features.

use crate::warehouse::Rows;
use banknote_sql::Value;

/// Errors turning warehouse rows into records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("source rows have no {0} column")]
    MissingColumn(&'static str),

    #[error("row {row}: {column} is not a number")]
    NotANumber { row: usize, column: &'static str },
}

/// One measured banknote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BanknoteRecord {
    pub variance: f64,
    pub skewness: f64,
    pub curtosis: f64,
    pub entropy: f64,
    /// Known label; absent for records still to be scored.
    pub class: Option<i64>,
}

const MEASUREMENTS: [&str; 4] = ["variance", "skewness", "curtosis", "entropy"];

impl BanknoteRecord {
    /// Read records from rows with `VARIANCE`, `SKEWNESS`, `CURTOSIS`,
    /// `ENTROPY` and optionally `CLASS` columns, in any case and order.
    pub fn read_all(rows: &Rows) -> Result<Vec<Self>, RecordError> {
        let mut idx = [0; 4];
        for (slot, name) in idx.iter_mut().zip(MEASUREMENTS) {
            *slot = rows
                .column_index(name)
                .ok_or(RecordError::MissingColumn(name))?;
        }
        let class_idx = rows.column_index("class");

        rows.iter()
            .enumerate()
            .map(|(row_no, row)| {
                let num = |i: usize| -> Result<f64, RecordError> {
                    row.get(idx[i])
                        .and_then(Value::as_f64)
                        .ok_or(RecordError::NotANumber {
                            row: row_no,
                            column: MEASUREMENTS[i],
                        })
                };
                Ok(BanknoteRecord {
                    variance: num(0)?,
                    skewness: num(1)?,
                    curtosis: num(2)?,
                    entropy: num(3)?,
                    class: class_idx.and_then(|i| row.get(i)).and_then(Value::as_i64),
                })
            })
            .collect()
    }
}

/// A record tagged with a globally unique key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedRecord {
    pub uniq_key: String,
    pub record: BanknoteRecord,
}

/// Give every record a random UUID v4 key.
pub fn add_unique_key(records: impl IntoIterator<Item = BanknoteRecord>) -> Vec<KeyedRecord> {
    records
        .into_iter()
        .map(|record| KeyedRecord {
            uniq_key: uuid::Uuid::new_v4().to_string(),
            record,
        })
        .collect()
}

/// Model input: the four measurements plus four derived features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub variance: f64,
    pub skewness: f64,
    pub curtosis: f64,
    pub entropy: f64,
    pub product_feature: f64,
    pub sum_feature: f64,
    pub ratio_feature: f64,
    pub complex_feature: f64,
}

impl FeatureRow {
    pub fn from_record(r: &BanknoteRecord) -> Self {
        Self {
            variance: r.variance,
            skewness: r.skewness,
            curtosis: r.curtosis,
            entropy: r.entropy,
            product_feature: product_feature(r),
            sum_feature: sum_feature(r),
            ratio_feature: ratio_feature(r),
            complex_feature: complex_feature(r),
        }
    }

    pub fn to_array(&self) -> [f64; 8] {
        [
            self.variance,
            self.skewness,
            self.curtosis,
            self.entropy,
            self.product_feature,
            self.sum_feature,
            self.ratio_feature,
            self.complex_feature,
        ]
    }
}

pub fn product_feature(r: &BanknoteRecord) -> f64 {
    r.variance * r.skewness * r.curtosis * r.entropy
}

pub fn sum_feature(r: &BanknoteRecord) -> f64 {
    r.variance + r.skewness + r.curtosis + r.entropy
}

/// `variance / (entropy + 1)`. Entropy of exactly -1 yields an infinite or
/// NaN ratio, which renders as NULL when written back.
pub fn ratio_feature(r: &BanknoteRecord) -> f64 {
    r.variance / (r.entropy + 1.0)
}

pub fn complex_feature(r: &BanknoteRecord) -> f64 {
    (r.variance + r.skewness) * (r.curtosis - r.entropy)
}
