//! Transient execution types: request, typed parameters, rows, outcomes.

use std::net::IpAddr;

use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::models::Actor;

/// A typed statement parameter, bound by declared type rather than
/// interpolated into the statement text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum QueryParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Date/time values are carried as typed timestamps so the driver binds
    /// them as date-time parameters, never as formatted strings.
    DateTime(NaiveDateTime),
}

/// One execution request. Produced per call, discarded after the outcome.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub query_text: String,
    pub connection_id: Uuid,
    pub params: Vec<QueryParam>,
    pub actor: Actor,
    pub client_ip: Option<IpAddr>,
}

/// One result row: an ordered list of (column name, value) pairs, preserving
/// the column order reported by the remote engine's result metadata.
///
/// Serializes as a JSON object in column order. Duplicate column names are
/// kept as-is; the last one wins in the serialized object, matching what a
/// JSON consumer would observe anyway.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(pub Vec<(String, JsonValue)>);

impl Row {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, column: impl Into<String>, value: JsonValue) {
        self.0.push((column.into(), value));
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.0
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl FromIterator<(String, JsonValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A normalized result set.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    pub rows: Vec<Row>,
    pub row_count: usize,
}

impl ResultSet {
    /// Normalizes the tabular shape returned by the protocol layer into an
    /// ordered list of rows plus a row count. Pure; an empty result set is
    /// valid and distinct from an error.
    pub fn normalize(rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self { rows, row_count }
    }
}

/// Terminal outcome of one successful execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub duration_ms: u64,
    /// Target database name, surfaced in response metadata.
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_serializes_in_column_order() {
        let mut row = Row::new();
        row.push("zeta", json!(1));
        row.push("alpha", json!("x"));
        row.push("mid", json!(null));
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":"x","mid":null}"#);
    }

    #[test]
    fn test_row_get() {
        let row: Row = vec![
            ("a".to_string(), json!(1)),
            ("b".to_string(), json!(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(row.get("b"), Some(&json!(2)));
        assert_eq!(row.get("c"), None);
    }

    #[test]
    fn test_normalize_preserves_order_and_counts() {
        let rows: Vec<Row> = (0..5)
            .map(|i| {
                vec![
                    ("a".to_string(), json!(i)),
                    ("b".to_string(), json!(i * 10)),
                ]
                .into_iter()
                .collect()
            })
            .collect();

        let set = ResultSet::normalize(rows);
        assert_eq!(set.row_count, 5);
        for (i, row) in set.rows.iter().enumerate() {
            let columns: Vec<&str> = row.columns().collect();
            assert_eq!(columns, vec!["a", "b"]);
            assert_eq!(row.get("a"), Some(&json!(i)));
        }
    }

    #[test]
    fn test_normalize_empty_is_valid() {
        let set = ResultSet::normalize(Vec::new());
        assert_eq!(set.row_count, 0);
        assert!(set.rows.is_empty());
    }

    #[test]
    fn test_query_param_deserialization() {
        let param: QueryParam =
            serde_json::from_str(r#"{"type":"int","value":42}"#).unwrap();
        assert_eq!(param, QueryParam::Int(42));

        let param: QueryParam =
            serde_json::from_str(r#"{"type":"date_time","value":"2024-03-01T12:30:00"}"#)
                .unwrap();
        assert!(matches!(param, QueryParam::DateTime(_)));
    }
}
