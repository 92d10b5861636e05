//! Table schema model and normalization.
//!
//! A [`TableSchema`] is an ordered mapping of column name to [`ColumnSpec`].
//! Schemas are compared after normalization: column names lower-cased, types
//! and defaults upper-cased. Column order never affects comparison, but the
//! declared order is kept for `CREATE TABLE`.
//!
//! ## Example
//!
//! ```
//! use banknote::{ColumnSpec, TableSchema};
//!
//! let table = TableSchema::new("original_data")
//!     .column(ColumnSpec::new("Variance", "float"))
//!     .column(ColumnSpec::new("class", "int").with_default(0));
//!
//! let table = table.normalize().unwrap();
//! assert_eq!(table.get("variance").unwrap().data_type, "FLOAT");
//! ```

use banknote_sql::{IdentError, validate_ident};
use indexmap::IndexMap;

/// Errors in a table declaration, raised before the warehouse is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("table name is empty")]
    EmptyTableName,

    #[error("table {table} declares no columns")]
    NoColumns { table: String },

    #[error("column {column} in table {table} has no type")]
    MissingType { table: String, column: String },

    #[error("column {column} is declared more than once in table {table}")]
    DuplicateColumn { table: String, column: String },

    #[error("invalid identifier: {0}")]
    Ident(#[from] IdentError),

    #[error("table {table} is schema-qualified; set the catalog schema instead")]
    QualifiedTableName { table: String },

    #[error("column {column} has a type with disallowed characters: {data_type}")]
    BadType { column: String, data_type: String },

    #[error("column {column} has a default with disallowed content: {default}")]
    BadDefault { column: String, default: String },
}

/// A single column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name; identity is case-insensitive.
    pub name: String,
    /// Warehouse type, e.g. `FLOAT`, `INT`, `VARCHAR(32)`.
    pub data_type: String,
    /// Default expression, `None` when the column has no default.
    pub default: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            default: None,
        }
    }

    /// Set the default. The value is stringified as-is.
    pub fn with_default(mut self, default: impl ToString) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Canonical form: lower-case name, upper-case type and default.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.to_lowercase(),
            data_type: self.data_type.to_uppercase(),
            default: normalize_default(self.default.as_deref()),
        }
    }

    /// Column definition as it appears in `CREATE TABLE` and `ADD COLUMN`:
    /// `<name> <type>[ DEFAULT <default>]`.
    pub fn definition_sql(&self) -> Result<String, IdentError> {
        let name = validate_ident(&self.name)?;
        let mut def = format!("{} {}", name, self.data_type);
        if let Some(default) = &self.default {
            def.push_str(&format!(" DEFAULT {}", default));
        }
        Ok(def)
    }
}

/// Compare two column specs: equal iff types match exactly and defaults
/// match exactly (both absent, or both present and equal).
pub fn specs_equal(a: &ColumnSpec, b: &ColumnSpec) -> bool {
    a.data_type == b.data_type && a.default == b.default
}

/// Upper-cased default. Only `None` is absent; an empty string is a
/// (distinct) present default.
pub(crate) fn normalize_default(default: Option<&str>) -> Option<String> {
    default.map(str::to_uppercase)
}

/// A table: name plus ordered columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSchema {
    pub name: String,
    columns: IndexMap<String, ColumnSpec>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
        }
    }

    /// Append a column. Declaring the same name twice replaces the earlier
    /// spec in place.
    pub fn column(mut self, spec: ColumnSpec) -> Self {
        self.push(spec);
        self
    }

    pub(crate) fn push(&mut self, spec: ColumnSpec) {
        self.columns.insert(spec.name.clone(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Columns in declaration (or catalog) order.
    pub fn columns(&self) -> impl ExactSizeIterator<Item = &ColumnSpec> {
        self.columns.values()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when there are no columns. For a schema read from the catalog
    /// this means the table does not exist.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Validate and canonicalize this declaration.
    ///
    /// Rejects an empty or schema-qualified table name, columns without a
    /// type, names that fail the identifier allow-list, and names that
    /// collide once lower-cased. Normalizing an already normalized schema
    /// returns it unchanged.
    pub fn normalize(&self) -> Result<TableSchema, SchemaError> {
        check_table_name(&self.name)?;

        if self.columns.is_empty() {
            return Err(SchemaError::NoColumns {
                table: self.name.clone(),
            });
        }

        let mut normalized = TableSchema::new(self.name.clone());
        for spec in self.columns.values() {
            if spec.data_type.trim().is_empty() {
                return Err(SchemaError::MissingType {
                    table: self.name.clone(),
                    column: spec.name.clone(),
                });
            }
            validate_ident(&spec.name)?;
            check_type(spec)?;
            check_default(spec)?;

            let spec = spec.normalized();
            if normalized.contains(&spec.name) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.name.clone(),
                    column: spec.name,
                });
            }
            normalized.push(spec);
        }

        Ok(normalized)
    }
}

/// Reconciliation looks tables up by bare name, so a `schema.table` name
/// would never be found in the catalog.
pub(crate) fn check_table_name(name: &str) -> Result<(), SchemaError> {
    if name.is_empty() {
        return Err(SchemaError::EmptyTableName);
    }
    validate_ident(name)?;
    if name.contains('.') {
        return Err(SchemaError::QualifiedTableName {
            table: name.to_owned(),
        });
    }
    Ok(())
}

/// Types are interpolated verbatim, so only the characters that appear in
/// type names are allowed: `FLOAT`, `NUMBER(38, 0)`, `DOUBLE PRECISION`.
fn check_type(spec: &ColumnSpec) -> Result<(), SchemaError> {
    let ok = spec
        .data_type
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '(' | ')' | ','));
    if ok {
        Ok(())
    } else {
        Err(SchemaError::BadType {
            column: spec.name.clone(),
            data_type: spec.data_type.clone(),
        })
    }
}

/// Defaults are expressions and can't be allow-listed by character, but
/// they must not be able to terminate the statement or comment out the rest.
/// An empty default would render as a dangling `DEFAULT`.
fn check_default(spec: &ColumnSpec) -> Result<(), SchemaError> {
    let Some(default) = &spec.default else {
        return Ok(());
    };
    if default.trim().is_empty()
        || default.contains(';')
        || default.contains("--")
        || default.contains("/*")
    {
        return Err(SchemaError::BadDefault {
            column: spec.name.clone(),
            default: default.clone(),
        });
    }
    Ok(())
}

impl std::fmt::Display for TableSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} ({} columns)", self.name, self.columns.len())?;
        for col in self.columns.values() {
            match &col.default {
                Some(default) => writeln!(f, "  {}: {} DEFAULT {}", col.name, col.data_type, default)?,
                None => writeln!(f, "  {}: {}", col.name, col.data_type)?,
            }
        }
        Ok(())
    }
}
