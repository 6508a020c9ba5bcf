//! Read-only statement execution contract

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

use super::QueryResult;
use crate::domain::sql::SqlRejection;

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Lexical validation refused the statement before it reached the database
    #[error("statement rejected: {0}")]
    Rejected(#[from] SqlRejection),

    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// The result holds a column type that cannot be decoded faithfully
    #[error("column {column} has unsupported type {type_name}")]
    UnsupportedType { column: String, type_name: String },

    /// Database-side failure. The text is for server logs only.
    #[error("database error: {0}")]
    Database(String),
}

/// Runs a single read-only statement
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<QueryResult, ExecutionError>;
}
