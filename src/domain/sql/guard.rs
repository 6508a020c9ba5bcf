//! Lexical SQL safety rules
//!
//! These checks are a fast-fail layer. The read-only transaction opened by the
//! executor remains the enforcement boundary.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Words in a user prompt that signal a write or DDL intention
static DANGEROUS_INTENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(hapus|delete|drop|remove|ubah|update|ganti|edit|alter|modify|tambah|insert|create|add|truncate|grant|revoke)\b",
    )
    .unwrap()
});

/// Whole-word keywords that are never allowed in an executed statement
static FORBIDDEN_KEYWORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(DROP|DELETE|INSERT|UPDATE|ALTER|TRUNCATE|CREATE|GRANT|REVOKE)\b").unwrap()
});

static SQL_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```sql(.*?)```").unwrap());

static SELECT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)select").unwrap());

/// Substrings that make generated SQL unusable, matched case-insensitively
const GENERATED_SQL_DENYLIST: [&str; 7] = [
    "insert", "update", "delete", "drop", "alter", "create", "truncate",
];

/// Reason a statement failed read-only validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlRejection {
    #[error("SQL statement is empty")]
    Empty,

    #[error("only SELECT or WITH statements are allowed")]
    NotReadOnly,

    #[error("forbidden keyword {0}")]
    ForbiddenKeyword(String),
}

/// Returns the first write-intent word found in the prompt, lower-cased
pub fn detect_dangerous_intent(prompt: &str) -> Option<String> {
    DANGEROUS_INTENT_PATTERN
        .find(prompt)
        .map(|m| m.as_str().to_lowercase())
}

/// Checks that a statement is a single read query
pub fn validate_read_only(sql: &str) -> Result<(), SqlRejection> {
    let upper = sql.trim().to_uppercase();

    if upper.is_empty() {
        return Err(SqlRejection::Empty);
    }

    if !upper.starts_with("SELECT") && !upper.starts_with("WITH") {
        return Err(SqlRejection::NotReadOnly);
    }

    if let Some(keyword) = FORBIDDEN_KEYWORD_PATTERN.find(&upper) {
        return Err(SqlRejection::ForbiddenKeyword(keyword.as_str().to_string()));
    }

    Ok(())
}

/// Pulls the SQL out of a model completion.
///
/// A ```sql fenced block wins; otherwise everything from the first `select`
/// onward is taken. Text without either is returned trimmed.
pub fn extract_sql(completion: &str) -> String {
    if let Some(captures) = SQL_FENCE_PATTERN.captures(completion) {
        if let Some(body) = captures.get(1) {
            return body.as_str().trim().to_string();
        }
    }

    match SELECT_PATTERN.find(completion) {
        Some(m) => completion[m.start()..].trim().to_string(),
        None => completion.trim().to_string(),
    }
}

/// Cleans extracted SQL and returns `None` when it is not usable.
///
/// Comment-only and blank lines are dropped. The remainder must start with
/// SELECT and must not contain any denylisted word, even as a substring.
pub fn sanitize_generated_sql(sql: &str) -> Option<String> {
    let cleaned = sql
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    if !cleaned.to_uppercase().starts_with("SELECT") {
        return None;
    }

    let lower = cleaned.to_lowercase();
    if GENERATED_SQL_DENYLIST.iter().any(|word| lower.contains(word)) {
        return None;
    }

    Some(cleaned)
}
