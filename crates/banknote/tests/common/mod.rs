//! In-memory warehouse for integration tests.
//!
//! Understands exactly the DDL shapes the reconciler emits, answers catalog
//! queries the way a case-folding warehouse would (upper-cased column names)
//! and records every statement it sees.

#![allow(dead_code)]

use banknote::{Rows, Value, Warehouse, WarehouseError};
use indexmap::IndexMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub data_type: String,
    pub default: Option<String>,
}

#[derive(Debug, Default)]
struct Table {
    columns: IndexMap<String, Column>,
    rows: Option<Rows>,
}

/// How queries should fail, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFailure {
    Connection,
    Rejected,
}

#[derive(Debug, Default)]
struct State {
    tables: IndexMap<String, Table>,
    executed: Vec<String>,
    queries: Vec<String>,
    fail_at: Option<usize>,
    query_failure: Option<QueryFailure>,
}

#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    state: Mutex<State>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with `(name, type, default)` columns.
    pub fn with_table(self, name: &str, columns: &[(&str, &str, Option<&str>)]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let table = state.tables.entry(name.to_uppercase()).or_default();
            for (col, ty, default) in columns {
                table.columns.insert(
                    col.to_uppercase(),
                    Column {
                        data_type: ty.to_uppercase(),
                        default: default.map(str::to_owned),
                    },
                );
            }
        }
        self
    }

    /// Rows returned by `SELECT * FROM name`.
    pub fn with_rows(self, name: &str, rows: Rows) -> Self {
        self.state
            .lock()
            .unwrap()
            .tables
            .entry(name.to_uppercase())
            .or_default()
            .rows = Some(rows);
        self
    }

    /// Reject the `n`th executed statement (1-based).
    pub fn fail_at(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_at = Some(n);
        self
    }

    pub fn fail_queries(self, failure: QueryFailure) -> Self {
        self.state.lock().unwrap().query_failure = Some(failure);
        self
    }

    /// Every statement passed to `execute`, including the rejected one.
    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    /// Current columns of a table, lower-cased, in catalog order.
    pub fn columns(&self, table: &str) -> Vec<(String, Column)> {
        let state = self.state.lock().unwrap();
        state
            .tables
            .get(&table.to_uppercase())
            .map(|t| {
                t.columns
                    .iter()
                    .map(|(k, v)| (k.to_lowercase(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_table(&self, table: &str) -> bool {
        let state = self.state.lock().unwrap();
        state
            .tables
            .get(&table.to_uppercase())
            .is_some_and(|t| !t.columns.is_empty())
    }
}

impl Warehouse for MemoryWarehouse {
    async fn query(&self, sql: &str) -> Result<Rows, WarehouseError> {
        let mut state = self.state.lock().unwrap();
        state.queries.push(sql.to_owned());

        match state.query_failure {
            Some(QueryFailure::Connection) => {
                return Err(WarehouseError::Connect("connection refused".into()));
            }
            Some(QueryFailure::Rejected) => {
                return Err(WarehouseError::Rejected("permission denied".into()));
            }
            None => {}
        }

        if sql.contains("INFORMATION_SCHEMA.COLUMNS") {
            let name = last_literal(sql).ok_or_else(|| bad(sql))?;
            let mut rows = Rows::new(["COLUMN_NAME", "DATA_TYPE", "COLUMN_DEFAULT"]);
            if let Some(table) = state.tables.get(&name.to_uppercase()) {
                for (col, spec) in &table.columns {
                    rows.push(vec![
                        Value::Text(col.clone()),
                        Value::Text(spec.data_type.clone()),
                        spec.default.clone().map(Value::Text).unwrap_or(Value::Null),
                    ]);
                }
            }
            return Ok(rows);
        }

        if let Some(name) = sql.strip_prefix("SELECT * FROM ") {
            return state
                .tables
                .get(&name.to_uppercase())
                .and_then(|t| t.rows.clone())
                .ok_or_else(|| WarehouseError::Rejected(format!("table {} does not exist", name)));
        }

        Err(bad(sql))
    }

    async fn execute(&self, sql: &str) -> Result<u64, WarehouseError> {
        let mut state = self.state.lock().unwrap();
        state.executed.push(sql.to_owned());

        if state.fail_at == Some(state.executed.len()) {
            return Err(WarehouseError::Rejected("boom".into()));
        }

        apply(&mut state, sql)
    }
}

fn bad(sql: &str) -> WarehouseError {
    WarehouseError::Rejected(format!("unsupported statement: {}", sql))
}

fn last_literal(sql: &str) -> Option<&str> {
    let end = sql.rfind('\'')?;
    let start = sql[..end].rfind('\'')?;
    Some(&sql[start + 1..end])
}

/// `name TYPE[ DEFAULT d]`
fn parse_definition(def: &str) -> Option<(String, Column)> {
    let (name, rest) = def.trim().split_once(' ')?;
    let (data_type, default) = match rest.split_once(" DEFAULT ") {
        Some((ty, d)) => (ty, Some(d.to_owned())),
        None => (rest, None),
    };
    Some((
        name.to_uppercase(),
        Column {
            data_type: data_type.to_owned(),
            default,
        },
    ))
}

/// Split on commas outside parentheses.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut start = 0;
    for (i, ch) in list.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

fn apply(state: &mut State, sql: &str) -> Result<u64, WarehouseError> {
    if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
        let (name, defs) = rest.split_once(" (").ok_or_else(|| bad(sql))?;
        let defs = defs.strip_suffix(')').ok_or_else(|| bad(sql))?;
        let key = name.to_uppercase();
        if state.tables.get(&key).is_some_and(|t| !t.columns.is_empty()) {
            return Err(WarehouseError::Rejected(format!("table {} already exists", name)));
        }
        let table = state.tables.entry(key).or_default();
        for def in split_top_level(defs) {
            let (col, spec) = parse_definition(def).ok_or_else(|| bad(sql))?;
            table.columns.insert(col, spec);
        }
        return Ok(0);
    }

    if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
        let rows = rest.matches("), (").count() + 1;
        return Ok(rows as u64);
    }

    let rest = sql.strip_prefix("ALTER TABLE ").ok_or_else(|| bad(sql))?;
    let (name, action) = rest.split_once(' ').ok_or_else(|| bad(sql))?;
    let table = state
        .tables
        .get_mut(&name.to_uppercase())
        .ok_or_else(|| WarehouseError::Rejected(format!("table {} does not exist", name)))?;

    if let Some(def) = action.strip_prefix("ADD COLUMN ") {
        let (col, spec) = parse_definition(def).ok_or_else(|| bad(sql))?;
        if table.columns.contains_key(&col) {
            return Err(WarehouseError::Rejected(format!("column {} already exists", col)));
        }
        table.columns.insert(col, spec);
    } else if let Some(col) = action.strip_prefix("DROP COLUMN ") {
        table
            .columns
            .shift_remove(&col.to_uppercase())
            .ok_or_else(|| WarehouseError::Rejected(format!("no column {}", col)))?;
    } else if let Some(alter) = action.strip_prefix("ALTER COLUMN ") {
        let (col, change) = alter.split_once(' ').ok_or_else(|| bad(sql))?;
        let spec = table
            .columns
            .get_mut(&col.to_uppercase())
            .ok_or_else(|| WarehouseError::Rejected(format!("no column {}", col)))?;
        if let Some(ty) = change.strip_prefix("TYPE ") {
            spec.data_type = ty.to_owned();
        } else if let Some(d) = change.strip_prefix("SET DEFAULT ") {
            spec.default = Some(d.to_owned());
        } else if change == "DROP DEFAULT" {
            spec.default = None;
        } else {
            return Err(bad(sql));
        }
    } else {
        return Err(bad(sql));
    }
    Ok(0)
}
