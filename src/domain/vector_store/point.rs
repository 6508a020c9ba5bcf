//! Points, filters and search results exchanged with a vector store

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arbitrary JSON payload attached to a point
pub type Payload = Map<String, Value>;

/// Distance metric of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Distance {
    #[default]
    #[serde(alias = "cosine")]
    Cosine,
    #[serde(alias = "dot")]
    Dot,
    #[serde(alias = "euclid")]
    Euclid,
}

impl Distance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "Cosine",
            Self::Dot => "Dot",
            Self::Euclid => "Euclid",
        }
    }
}

/// A vector with its identity and payload, ready to upsert
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

impl VectorPoint {
    pub fn new(id: impl Into<String>, vector: Vec<f32>, payload: Payload) -> Self {
        Self {
            id: id.into(),
            vector,
            payload,
        }
    }
}

/// Search hit with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: Payload,
}

impl ScoredPoint {
    /// String value of a payload key, if present
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}

/// Stored point as returned by a listing (vector omitted)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredPoint {
    pub id: String,
    pub payload: Payload,
}

/// Exact-match conditions on payload keys, all of which must hold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointFilter {
    conditions: Vec<(String, Value)>,
}

impl PointFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value`
    pub fn must_match(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((key.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether a payload satisfies every condition
    pub fn matches(&self, payload: &Payload) -> bool {
        self.conditions
            .iter()
            .all(|(key, value)| payload.get(key) == Some(value))
    }
}

/// Which points a delete applies to
#[derive(Debug, Clone, PartialEq)]
pub enum PointSelector {
    Ids(Vec<String>),
    Filter(PointFilter),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_matches_all_conditions() {
        let filter = PointFilter::new()
            .must_match("category", "sql")
            .must_match("schema_fingerprint", "abc");

        assert!(filter.matches(&payload(json!({
            "category": "sql",
            "schema_fingerprint": "abc",
            "content": "SELECT 1"
        }))));
        assert!(!filter.matches(&payload(json!({"category": "sql"}))));
        assert!(!filter.matches(&payload(json!({"category": "ddl", "schema_fingerprint": "abc"}))));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(PointFilter::new().matches(&Payload::new()));
    }

    #[test]
    fn test_payload_str() {
        let point = ScoredPoint {
            id: "1".to_string(),
            score: 0.9,
            payload: payload(json!({"sql_query": "SELECT 1", "n": 3})),
        };

        assert_eq!(point.payload_str("sql_query"), Some("SELECT 1"));
        assert_eq!(point.payload_str("n"), None);
        assert_eq!(point.payload_str("missing"), None);
    }
}
