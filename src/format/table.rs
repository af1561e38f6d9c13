/// Semantic tables and records built from JSON items.
use serde_json::{Map, Value};

use super::ColumnSpec;

/// Ordered headers plus rows positionally aligned to them.
#[derive(Debug, Clone, PartialEq)]
pub struct TableResult {
    pub headers: Vec<ColumnSpec>,
    /// Every row has exactly `headers.len()` cells.
    pub rows: Vec<Vec<Value>>,
}

impl TableResult {
    /// Display labels, in column order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.headers.iter().map(ColumnSpec::label).collect()
    }

    /// Keep only the columns selected by `names`, in their original order.
    #[must_use]
    pub fn project(self, names: &[String]) -> Self {
        let keep: Vec<bool> = self
            .headers
            .iter()
            .map(|h| names.iter().any(|n| h.matches(n)))
            .collect();
        let headers = self
            .headers
            .into_iter()
            .zip(&keep)
            .filter_map(|(h, &k)| k.then_some(h))
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&keep)
                    .filter_map(|(cell, &k)| k.then_some(cell))
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }

    /// Rows as JSON objects keyed by display label.
    #[must_use]
    pub fn to_objects(&self) -> Vec<Value> {
        let labels = self.labels();
        self.rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> =
                    labels.iter().cloned().zip(row.iter().cloned()).collect();
                Value::Object(object)
            })
            .collect()
    }
}

/// A single entity's (label, value) pairs, for vertical display.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordResult {
    pub fields: Vec<(ColumnSpec, Value)>,
}

impl RecordResult {
    #[cfg(test)]
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.fields.iter().map(|(c, _)| c.label()).collect()
    }

    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.fields.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Keep only the fields selected by `names`.
    #[must_use]
    pub fn project(self, names: &[String]) -> Self {
        Self {
            fields: self
                .fields
                .into_iter()
                .filter(|(c, _)| names.iter().any(|n| c.matches(n)))
                .collect(),
        }
    }

    /// The record as one JSON object keyed by display label.
    #[must_use]
    pub fn to_object(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(c, v)| (c.label(), v.clone()))
                .collect(),
        )
    }
}

/// Build a table: one row per item, one cell per column, `null` when absent.
#[must_use]
pub fn to_table(items: &[Value], columns: &[ColumnSpec]) -> TableResult {
    let rows = items
        .iter()
        .map(|item| columns.iter().map(|c| lookup(item, &c.key)).collect())
        .collect();
    TableResult {
        headers: columns.to_vec(),
        rows,
    }
}

/// Build a record: one (label, value) pair per field of `item`.
#[must_use]
pub fn to_record(item: &Value, fields: &[ColumnSpec]) -> RecordResult {
    RecordResult {
        fields: fields
            .iter()
            .map(|c| (c.clone(), lookup(item, &c.key)))
            .collect(),
    }
}

/// Text shown for one cell: null is empty, strings verbatim, arrays joined by `, `.
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Exact top-level key lookup; no dotted traversal.
fn lookup(item: &Value, key: &str) -> Value {
    item.get(key).cloned().unwrap_or(Value::Null)
}
