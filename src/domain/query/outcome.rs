//! Results and failures of resolving a prompt

use serde::Serialize;
use thiserror::Error;

use super::QueryResult;
use crate::domain::sql::SqlRejection;

/// Static suggestion returned when nothing similar is indexed
pub const NO_MATCH_SUGGESTION: &str =
    "Tidak ada data yang mirip. Coba gunakan kata kunci yang lebih spesifik.";

/// Example questions offered for prompts unrelated to the ledger
pub const OFF_TOPIC_SUGGESTIONS: [&str; 2] = [
    "ada berapa orang penabung saat ini",
    "nasabah yang jenis tabungan nya deposito",
];

/// Where the executed SQL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlSource {
    Cache,
    Generated,
}

/// Successful end of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutcome {
    Resolved {
        sql: String,
        source: SqlSource,
        result: QueryResult,
    },
    Ambiguous {
        message: String,
        suggestions: Vec<String>,
    },
}

impl QueryOutcome {
    pub fn ambiguous(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self::Ambiguous {
            message: message.into(),
            suggestions,
        }
    }

    /// Off-topic prompt answer
    pub fn off_topic() -> Self {
        Self::ambiguous(
            "Pertanyaan tidak relevan",
            OFF_TOPIC_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        )
    }

    /// Low-confidence prompt answer
    pub fn unclear(suggestions: Vec<String>) -> Self {
        Self::ambiguous(
            "Maaf, pertanyaan Anda kurang jelas atau tidak cukup spesifik",
            suggestions,
        )
    }
}

/// Stage at which resolving a prompt failed
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("prompt contains write intent '{word}'")]
    DangerousIntent { word: String },

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("generator produced no usable SQL")]
    EmptySql,

    #[error("unsafe SQL: {0}")]
    UnsafeSql(SqlRejection),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Stable code exposed to clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyPrompt => "EMPTY_PROMPT",
            Self::DangerousIntent { .. } => "DANGEROUS_INTENT",
            Self::Embedding(_) => "EMBEDDING_FAILED",
            Self::SchemaUnavailable(_) => "SCHEMA_UNAVAILABLE",
            Self::Generation(_) => "AI_GENERATION_FAILED",
            Self::EmptySql => "EMPTY_SQL",
            Self::UnsafeSql(_) => "UNSAFE_SQL",
            Self::Execution(_) => "QUERY_EXECUTION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show a client. Never carries upstream error text.
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyPrompt => "Prompt tidak boleh kosong".to_string(),
            Self::DangerousIntent { word } => format!(
                "Permintaan ditolak: mengandung kata kunci manipulasi '{}'.",
                word
            ),
            Self::Embedding(_) | Self::SchemaUnavailable(_) | Self::Internal(_) => {
                "Layanan sedang bermasalah".to_string()
            }
            Self::Generation(_) => "Gagal menghasilkan query SQL".to_string(),
            Self::EmptySql => "AI tidak menghasilkan query SQL yang valid".to_string(),
            Self::UnsafeSql(_) => "Query ditolak karena bukan operasi baca".to_string(),
            Self::Execution(_) => {
                "Query tidak dapat dieksekusi. Mungkin syntax salah atau melanggar aturan database"
                    .to_string()
            }
        }
    }

    /// User-safe detail, if any
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::DangerousIntent { word } => Some(word.clone()),
            Self::UnsafeSql(rejection) => Some(rejection.to_string()),
            _ => None,
        }
    }
}
