//! Success bodies

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::query::QueryOutcome;

const SUCCESS_MESSAGE: &str = "Query berhasil dieksekusi";

/// Body of `/api/query`: `{status: success|ambiguous, message, data?, suggestions?}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Map<String, Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl From<QueryOutcome> for QueryResponse {
    fn from(outcome: QueryOutcome) -> Self {
        match outcome {
            QueryOutcome::Resolved { result, .. } => Self {
                status: "success",
                message: SUCCESS_MESSAGE.to_string(),
                data: Some(result.to_records()),
                suggestions: None,
            },
            QueryOutcome::Ambiguous {
                message,
                suggestions,
            } => Self {
                status: "ambiguous",
                message,
                data: None,
                suggestions: Some(suggestions),
            },
        }
    }
}

/// Acknowledgement of an admin or feedback action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ack {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Ack {
    pub fn new(status: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::{QueryResult, SqlSource, SqlValue};

    #[test]
    fn test_resolved_response() {
        let outcome = QueryOutcome::Resolved {
            sql: "SELECT nama FROM nasabah".into(),
            source: SqlSource::Generated,
            result: QueryResult::new(vec!["nama".into()], vec![vec![SqlValue::from("Budi")]]),
        };

        let json = serde_json::to_value(QueryResponse::from(outcome)).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["data"][0]["nama"], "Budi");
        assert!(json.get("suggestions").is_none());
    }

    #[test]
    fn test_ambiguous_response() {
        let json = serde_json::to_value(QueryResponse::from(QueryOutcome::off_topic())).unwrap();

        assert_eq!(json["status"], "ambiguous");
        assert_eq!(json["message"], "Pertanyaan tidak relevan");
        assert_eq!(json["suggestions"].as_array().unwrap().len(), 2);
        assert!(json.get("data").is_none());
    }
}
