//! Chainable table client over a [`KeyValueBackend`].
//!
//! ```ignore
//! let docs = db
//!     .from("documents")
//!     .select()
//!     .eq("owner_id", "user-1")
//!     .order("updated_at", false)
//!     .limit(20)
//!     .execute()
//!     .await?;
//! ```

use super::{SharedBackend, StorageError, StorageResult};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use uuid::Uuid;

/// A single table row.
pub type Record = Map<String, Value>;

/// Prefix of the backend key holding a table.
pub const TABLE_KEY_PREFIX: &str = "flux_";

pub const ID: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Convert a typed value into a record.
pub fn to_record<T: Serialize>(value: &T) -> StorageResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::Serialization(format!(
            "Expected a JSON object, got {}",
            other
        ))),
    }
}

/// Convert a record back into a typed value.
pub fn from_record<T: DeserializeOwned>(record: Record) -> StorageResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Client for the local tables.
#[derive(Clone)]
pub struct LocalDb {
    backend: SharedBackend,
}

impl LocalDb {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Start a query on `table`.
    pub fn from(&self, table: &str) -> Query<'_> {
        Query {
            db: self,
            table: table.to_string(),
            operation: Operation::Select,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Underlying backend.
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    fn table_key(table: &str) -> String {
        format!("{}{}", TABLE_KEY_PREFIX, table)
    }

    async fn read_table(&self, table: &str) -> StorageResult<Vec<Record>> {
        let Some(json) = self.backend.get(&Self::table_key(table)).await? else {
            return Ok(Vec::new());
        };
        let rows: Vec<Record> = serde_json::from_str(&json).map_err(|e| {
            StorageError::Serialization(format!("Table {} is corrupt: {}", table, e))
        })?;
        Ok(rows)
    }

    async fn write_table(&self, table: &str, rows: &[Record]) -> StorageResult<()> {
        let json = serde_json::to_string(rows)?;
        self.backend.set(&Self::table_key(table), json).await
    }
}

#[derive(Debug, Clone)]
enum Operation {
    Select,
    Insert(Vec<Record>),
    Update(Record),
    Delete,
}

/// A pending query. Nothing touches the backend until [`Query::execute`].
pub struct Query<'a> {
    db: &'a LocalDb,
    table: String,
    operation: Operation,
    filters: Vec<(String, Value)>,
    order: Option<(String, bool)>,
    limit: Option<usize>,
}

impl<'a> Query<'a> {
    pub fn select(mut self) -> Self {
        self.operation = Operation::Select;
        self
    }

    /// Insert rows. Missing `id` values are generated; timestamps are stamped.
    pub fn insert(mut self, records: Vec<Record>) -> Self {
        self.operation = Operation::Insert(records);
        self
    }

    /// Merge `patch` into every matching row. `id` and `created_at` are immutable.
    pub fn update(mut self, patch: Record) -> Self {
        self.operation = Operation::Update(patch);
        self
    }

    pub fn delete(mut self) -> Self {
        self.operation = Operation::Delete;
        self
    }

    /// Keep rows whose `column` equals `value`. Filters combine with AND.
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    fn matches(&self, row: &Record) -> bool {
        self.filters
            .iter()
            .all(|(column, value)| row.get(column).unwrap_or(&Value::Null) == value)
    }

    /// Run the query, returning selected or affected rows.
    pub async fn execute(self) -> StorageResult<Vec<Record>> {
        let mut rows = self.db.read_table(&self.table).await?;

        match &self.operation {
            Operation::Select => {
                let mut selected: Vec<Record> =
                    rows.into_iter().filter(|row| self.matches(row)).collect();
                if let Some((column, ascending)) = &self.order {
                    selected.sort_by(|a, b| {
                        let ord = compare_values(a.get(column), b.get(column));
                        if *ascending { ord } else { ord.reverse() }
                    });
                }
                if let Some(n) = self.limit {
                    selected.truncate(n);
                }
                Ok(selected)
            }
            Operation::Insert(records) => {
                let timestamp = now();
                let mut inserted = Vec::with_capacity(records.len());
                for record in records {
                    let mut record = record.clone();
                    if !matches!(record.get(ID), Some(Value::String(_))) {
                        record.insert(ID.to_string(), Value::String(Uuid::new_v4().to_string()));
                    }
                    record
                        .entry(CREATED_AT.to_string())
                        .or_insert_with(|| Value::String(timestamp.clone()));
                    record.insert(UPDATED_AT.to_string(), Value::String(timestamp.clone()));
                    inserted.push(record);
                }
                rows.extend(inserted.iter().cloned());
                self.db.write_table(&self.table, &rows).await?;
                log::debug!("Inserted {} rows into {}", inserted.len(), self.table);
                Ok(inserted)
            }
            Operation::Update(patch) => {
                let timestamp = now();
                let mut updated = Vec::new();
                for row in rows.iter_mut().filter(|row| self.matches(row)) {
                    for (column, value) in patch {
                        if column == ID || column == CREATED_AT {
                            continue;
                        }
                        row.insert(column.clone(), value.clone());
                    }
                    row.insert(UPDATED_AT.to_string(), Value::String(timestamp.clone()));
                    updated.push(row.clone());
                }
                self.db.write_table(&self.table, &rows).await?;
                log::debug!("Updated {} rows in {}", updated.len(), self.table);
                Ok(updated)
            }
            Operation::Delete => {
                let (deleted, kept): (Vec<Record>, Vec<Record>) =
                    rows.into_iter().partition(|row| self.matches(row));
                self.db.write_table(&self.table, &kept).await?;
                log::debug!("Deleted {} rows from {}", deleted.len(), self.table);
                Ok(deleted)
            }
        }
    }
}

/// Ordering used by `order`: missing/null first, then numbers, strings, bools.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
