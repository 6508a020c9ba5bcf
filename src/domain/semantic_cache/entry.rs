//! Cache entries and lookup matches

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::sql::validate_read_only;
use crate::domain::vector_store::{Payload, ScoredPoint, VectorPoint};
use crate::domain::DomainError;

/// Payload key holding the original prompt
pub const PROMPT_KEY: &str = "prompt_asli";
/// Payload key holding the resolved SQL
pub const SQL_KEY: &str = "sql_query";
/// Payload key holding the schema generation the SQL was produced against
pub const GENERATION_KEY: &str = "schema_fingerprint";
const CREATED_AT_KEY: &str = "created_at";

/// A (vector, prompt, SQL) triple owned by the semantic cache.
///
/// The SQL is checked at construction, so an entry can only hold a statement
/// that passed read-only validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    id: String,
    vector: Vec<f32>,
    prompt: String,
    sql: String,
    generation: String,
    created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        vector: Vec<f32>,
        prompt: impl Into<String>,
        sql: impl Into<String>,
        generation: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Self::with_id(Uuid::new_v4().to_string(), vector, prompt, sql, generation)
    }

    /// Build an entry that replaces an existing id
    pub fn with_id(
        id: impl Into<String>,
        vector: Vec<f32>,
        prompt: impl Into<String>,
        sql: impl Into<String>,
        generation: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let sql = sql.into().trim().to_string();
        validate_read_only(&sql).map_err(|e| DomainError::unsafe_sql(e.to_string()))?;

        if vector.is_empty() {
            return Err(DomainError::validation("Cache entry vector is empty"));
        }

        Ok(Self {
            id: id.into(),
            vector,
            prompt: prompt.into(),
            sql,
            generation: generation.into(),
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert(PROMPT_KEY.to_string(), Value::from(self.prompt.clone()));
        payload.insert(SQL_KEY.to_string(), Value::from(self.sql.clone()));
        payload.insert(GENERATION_KEY.to_string(), Value::from(self.generation.clone()));
        payload.insert(CREATED_AT_KEY.to_string(), Value::from(self.created_at.to_rfc3339()));
        payload
    }

    pub fn into_point(self) -> VectorPoint {
        let payload = self.payload();
        VectorPoint::new(self.id, self.vector, payload)
    }
}

/// A cache entry returned by a lookup, with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheMatch {
    pub id: String,
    pub prompt: String,
    pub sql: String,
    pub score: f32,
}

impl CacheMatch {
    /// Read a match back from a vector store hit. Points without SQL are skipped.
    pub fn from_scored(point: &ScoredPoint) -> Option<Self> {
        let sql = point.payload_str(SQL_KEY)?;

        Some(Self {
            id: point.id.clone(),
            prompt: point.payload_str(PROMPT_KEY).unwrap_or_default().to_string(),
            sql: sql.to_string(),
            score: point.score,
        })
    }
}
