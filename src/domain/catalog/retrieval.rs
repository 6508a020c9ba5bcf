//! Worked SQL examples, retrieval results and the confidence policy

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::vector_store::{Payload, ScoredPoint};

/// Payload key holding the full indexed text
pub const CONTENT_KEY: &str = "content";
/// Payload key holding the short question preview
pub const PREVIEW_KEY: &str = "prompt_preview";
/// Payload key holding the category tag
pub const CATEGORY_KEY: &str = "category";

const QUESTION_PREFIX: &str = "pertanyaan:";

/// Upper bound on clarifying suggestions in one answer
pub const MAX_SUGGESTIONS: usize = 5;

/// Kind of content indexed in the retrieval collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExampleCategory {
    /// Table DDL
    Ddl,
    /// Question with its worked SQL
    Sql,
}

impl ExampleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ddl => "ddl",
            Self::Sql => "sql",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ddl" => Some(Self::Ddl),
            "sql" => Some(Self::Sql),
            _ => None,
        }
    }
}

/// A curated question/SQL pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlExample {
    /// Annotated question line, e.g. `-- Pertanyaan: "..."`
    pub question: String,
    pub sql: String,
}

impl SqlExample {
    pub fn new(question: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            sql: sql.into(),
        }
    }

    /// Example built from a user correction
    pub fn from_correction(prompt: &str, sql: &str) -> Self {
        Self::new(format!("-- Pertanyaan: \"{}\"", prompt.trim()), sql.trim())
    }

    /// Text that is embedded and shown to the generator
    pub fn content(&self) -> String {
        format!("{}\n{}", self.question, self.sql)
    }

    pub fn preview(&self) -> String {
        clean_question(&self.question)
    }

    pub fn payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert(CONTENT_KEY.to_string(), Value::from(self.content()));
        payload.insert(PREVIEW_KEY.to_string(), Value::from(self.preview()));
        payload.insert(
            CATEGORY_KEY.to_string(),
            Value::from(ExampleCategory::Sql.as_str()),
        );
        payload
    }
}

/// Strips the question annotation down to the bare question
pub fn clean_question(text: &str) -> String {
    let text = text.replace("--", "");
    let text = text.trim();

    let has_prefix = text
        .get(..QUESTION_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(QUESTION_PREFIX));
    let text = if has_prefix {
        &text[QUESTION_PREFIX.len()..]
    } else {
        text
    };

    text.replace('"', "").trim().to_string()
}

/// Payload for an indexed DDL fragment
pub fn ddl_payload(ddl: &str) -> Payload {
    let mut payload = Payload::new();
    payload.insert(CONTENT_KEY.to_string(), Value::from(ddl));
    payload.insert(
        CATEGORY_KEY.to_string(),
        Value::from(ExampleCategory::Ddl.as_str()),
    );
    payload
}

/// An indexed example surfaced by similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedExample {
    pub content: String,
    pub preview: Option<String>,
    pub score: f32,
    pub category: Option<ExampleCategory>,
}

impl RetrievedExample {
    /// Points without content are skipped
    pub fn from_scored(point: &ScoredPoint) -> Option<Self> {
        let content = point.payload_str(CONTENT_KEY)?;

        Some(Self {
            content: content.to_string(),
            preview: point
                .payload_str(PREVIEW_KEY)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            score: point.score,
            category: point.payload_str(CATEGORY_KEY).and_then(ExampleCategory::parse),
        })
    }

    /// Question to offer as a suggestion: the preview, else the first content line
    pub fn suggestion(&self) -> Option<String> {
        let candidate = match self.preview {
            Some(ref preview) => clean_question(preview),
            None => clean_question(self.content.lines().next().unwrap_or_default()),
        };

        (!candidate.is_empty()).then_some(candidate)
    }
}

/// What to do when the best retrieved example scores below the confidence threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowConfidencePolicy {
    /// Answer with clarifying suggestions instead of generating
    #[default]
    Clarify,
    /// Drop the retrieved context and generate from the schema alone
    ZeroShot,
}

/// Retrieval settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Category tag searched for worked examples
    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default)]
    pub low_confidence_policy: LowConfidencePolicy,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_search_limit() -> usize {
    7
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_category() -> String {
    ExampleCategory::Sql.as_str().to_string()
}

fn default_max_suggestions() -> usize {
    MAX_SUGGESTIONS
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            confidence_threshold: default_confidence_threshold(),
            category: default_category(),
            low_confidence_policy: LowConfidencePolicy::default(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

impl RagConfig {
    pub fn with_policy(mut self, policy: LowConfidencePolicy) -> Self {
        self.low_confidence_policy = policy;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// True when the best score clears the confidence gate
    pub fn is_confident(&self, best_score: f32) -> bool {
        best_score >= self.confidence_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_question() {
        assert_eq!(
            clean_question("-- Pertanyaan: \"siapa nasabah dengan saldo terbanyak?\""),
            "siapa nasabah dengan saldo terbanyak?"
        );
        assert_eq!(clean_question("  total transaksi hari ini "), "total transaksi hari ini");
    }

    #[test]
    fn test_example_from_correction() {
        let example = SqlExample::from_correction(" jumlah nasabah ", "SELECT COUNT(*) FROM nasabah");

        assert_eq!(example.question, "-- Pertanyaan: \"jumlah nasabah\"");
        assert_eq!(
            example.content(),
            "-- Pertanyaan: \"jumlah nasabah\"\nSELECT COUNT(*) FROM nasabah"
        );
        assert_eq!(example.preview(), "jumlah nasabah");
        assert_eq!(example.payload().get(CATEGORY_KEY), Some(&Value::from("sql")));
    }

    #[test]
    fn test_suggestion_prefers_preview() {
        let example = RetrievedExample {
            content: "-- Pertanyaan: \"a\"\nSELECT 1".to_string(),
            preview: Some("berapa jumlah rekening aktif".to_string()),
            score: 0.4,
            category: Some(ExampleCategory::Sql),
        };

        assert_eq!(example.suggestion().as_deref(), Some("berapa jumlah rekening aktif"));
    }

    #[test]
    fn test_suggestion_from_first_content_line() {
        let example = RetrievedExample {
            content: "-- Pertanyaan: \"nasabah dengan deposito\"\nSELECT 1".to_string(),
            preview: None,
            score: 0.4,
            category: None,
        };

        assert_eq!(example.suggestion().as_deref(), Some("nasabah dengan deposito"));
    }

    #[test]
    fn test_from_scored_point() {
        let point = ScoredPoint {
            id: "1".to_string(),
            score: 0.8,
            payload: ddl_payload("CREATE TABLE nasabah ();"),
        };

        let example = RetrievedExample::from_scored(&point).unwrap();
        assert_eq!(example.category, Some(ExampleCategory::Ddl));
        assert_eq!(example.preview, None);
    }

    #[test]
    fn test_confidence_gate() {
        let config = RagConfig::default();

        assert!(config.is_confident(0.5));
        assert!(!config.is_confident(0.49));
        assert_eq!(config.low_confidence_policy, LowConfidencePolicy::Clarify);
        assert_eq!(config.category, "sql");
    }
}
