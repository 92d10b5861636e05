use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("warehouse error: {0}")]
    Warehouse(#[from] crate::WarehouseError),

    #[error(transparent)]
    Reconcile(#[from] crate::ReconcileError),

    #[error("invalid schema: {0}")]
    Schema(#[from] crate::SchemaError),

    #[error("configuration error: {0}")]
    Config(#[from] crate::ConfigError),

    #[error("bad source record: {0}")]
    Record(#[from] crate::RecordError),

    #[error("classifier returned {got} labels for {expected} rows")]
    Prediction { expected: usize, got: usize },
}

/// Result type for banknote operations.
pub type Result<T> = std::result::Result<T, Error>;
