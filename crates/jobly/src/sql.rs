//! Partial-update and filter fragments.
//!
//! Request payloads name fields in camelCase while the tables use snake_case
//! columns. The functions here translate an ordered set of logical fields into
//! a SQL fragment with `$1, $2, ...` placeholders and a matching value list,
//! ready to be spliced into a hand-written query.
//!
//! # Example
//!
//! ```ignore
//! use jobly::sql::{FieldSet, NameTable, partial_update};
//!
//! const COLUMNS: NameTable = NameTable::new(&[("numEmployees", "num_employees")]);
//!
//! let mut data = FieldSet::new();
//! data.insert("name", "Acme").insert("numEmployees", 50);
//!
//! let set = partial_update(&data, &COLUMNS)?;
//! assert_eq!(set.sql(), r#""name"=$1, "num_employees"=$2"#);
//! ```
//!
//! Values are always bound positionally. Column names and comparison
//! expressions come from a [`NameTable`], which only accepts `'static`
//! strings so that it cannot be assembled from request data.

use crate::error::{JoblyError, JoblyResult};
use crate::value::SqlValue;
use serde::Serialize;
use std::fmt::Write;
use tokio_postgres::types::ToSql;

/// Logical key whose filter value is wrapped in `%` wildcards.
pub const FUZZY_TEXT_KEY: &str = "nameLike";

/// Trusted mapping from logical field names to physical SQL.
///
/// For updates an entry maps to a column name; a logical name without an
/// entry is used verbatim. For filters an entry maps to a comparison
/// expression ending just before the placeholder, e.g. `"num_employees >="`,
/// and every filter key must have one.
#[derive(Debug, Clone, Copy)]
pub struct NameTable {
    entries: &'static [(&'static str, &'static str)],
    fuzzy_key: &'static str,
}

impl NameTable {
    pub const EMPTY: NameTable = NameTable::new(&[]);

    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            entries,
            fuzzy_key: FUZZY_TEXT_KEY,
        }
    }

    /// Designate a different key for `%value%` rewriting.
    pub const fn with_fuzzy_key(mut self, key: &'static str) -> Self {
        self.fuzzy_key = key;
        self
    }

    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(logical, _)| *logical == key)
            .map(|(_, physical)| *physical)
    }

    pub fn fuzzy_key(&self) -> &'static str {
        self.fuzzy_key
    }
}

/// Insertion-ordered mapping from logical key to value.
///
/// The order keys are inserted in is the order placeholders are numbered in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    entries: Vec<(String, SqlValue)>,
}

/// Filters share the representation of update fields.
pub type FilterSet = FieldSet;

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value. Re-inserting a key replaces its value but keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SqlValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Insert only when `value` is `Some`.
    pub fn insert_opt<T: Into<SqlValue>>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.insert(key, v);
        }
        self
    }

    /// Build from a JSON object, keeping its key order.
    pub fn from_json(value: serde_json::Value) -> JoblyResult<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(JoblyError::unsupported("<root>", "expected a JSON object"));
        };

        let mut set = Self::new();
        for (key, value) in map {
            let value = SqlValue::from_json(&key, value)?;
            set.entries.push((key, value));
        }
        Ok(set)
    }

    /// Build from any serializable struct or map.
    ///
    /// Fields skipped during serialization (e.g. `skip_serializing_if =
    /// "Option::is_none"`) are absent from the set; fields serialized as
    /// `null` are present with a NULL value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> JoblyResult<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| JoblyError::unsupported("<root>", e.to_string()))?;
        Self::from_json(json)
    }

    pub fn get(&self, key: &str) -> Option<&SqlValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A SQL fragment and the values for its placeholders.
///
/// Placeholder `$i` is bound to `values()[i - 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    sql: String,
    values: Vec<SqlValue>,
}

impl SqlFragment {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.values)
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Placeholder for a parameter appended after this fragment's values.
    pub fn next_placeholder(&self) -> String {
        format!("${}", self.values.len() + 1)
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}

/// Build the body of a `SET` clause from a partial update.
///
/// `{name: "Acme", numEmployees: 50}` with `numEmployees -> num_employees`
/// becomes `"name"=$1, "num_employees"=$2` bound to `["Acme", 50]`.
///
/// Fails with [`JoblyError::NoUpdatableFields`] when `fields` is empty.
pub fn partial_update(fields: &FieldSet, names: &NameTable) -> JoblyResult<SqlFragment> {
    if fields.is_empty() {
        return Err(JoblyError::NoUpdatableFields);
    }

    let mut sql = String::new();
    let mut values = Vec::with_capacity(fields.len());
    for (idx, (key, value)) in fields.iter().enumerate() {
        if idx > 0 {
            sql.push_str(", ");
        }
        let column = names.get(key).unwrap_or(key);
        push_quoted(&mut sql, column);
        let _ = write!(sql, "=${}", idx + 1);
        values.push(value.clone());
    }

    tracing::debug!(placeholders = values.len(), "built SET fragment");
    Ok(SqlFragment { sql, values })
}

/// Build a `WHERE` clause from a filter set, conditions joined with `AND`.
///
/// An empty filter set yields an empty fragment. The value of the table's
/// fuzzy-text key is bound as `%value%`; `filters` itself is left untouched.
///
/// Fails with [`JoblyError::UnknownFilter`] when a key has no table entry.
pub fn where_clause(filters: &FilterSet, names: &NameTable) -> JoblyResult<SqlFragment> {
    if filters.is_empty() {
        return Ok(SqlFragment::default());
    }

    let mut sql = String::from("WHERE ");
    let mut values = Vec::with_capacity(filters.len());
    for (idx, (key, value)) in filters.iter().enumerate() {
        let expr = names.get(key).ok_or_else(|| JoblyError::UnknownFilter {
            key: key.to_string(),
        })?;
        if idx > 0 {
            sql.push_str(" AND ");
        }
        let _ = write!(sql, "{} ${}", expr, idx + 1);

        if key == names.fuzzy_key() {
            values.push(wildcard(key, value)?);
        } else {
            values.push(value.clone());
        }
    }

    tracing::debug!(placeholders = values.len(), "built WHERE fragment");
    Ok(SqlFragment { sql, values })
}

fn wildcard(key: &str, value: &SqlValue) -> JoblyResult<SqlValue> {
    match value {
        SqlValue::Text(s) => Ok(SqlValue::Text(format!("%{s}%"))),
        _ => Err(JoblyError::unsupported(key, "fuzzy match requires a text value")),
    }
}

fn push_quoted(out: &mut String, name: &str) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}
