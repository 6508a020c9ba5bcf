use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Catalog error: {message}")]
    Catalog { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Vector store error: {message}")]
    VectorStore { message: String },

    #[error("Unsafe SQL: {message}")]
    UnsafeSql { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::VectorStore {
            message: message.into(),
        }
    }

    pub fn unsafe_sql(message: impl Into<String>) -> Self {
        Self::UnsafeSql {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("Point 'abc' not found");
        assert_eq!(error.to_string(), "Not found: Point 'abc' not found");
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Prompt is required");
        assert_eq!(error.to_string(), "Validation error: Prompt is required");
    }

    #[test]
    fn test_provider_error() {
        let error = DomainError::provider("groq", "HTTP 503");
        assert_eq!(error.to_string(), "Provider error: groq - HTTP 503");
    }

    #[test]
    fn test_unsafe_sql_error() {
        let error = DomainError::unsafe_sql("forbidden keyword DROP");
        assert_eq!(error.to_string(), "Unsafe SQL: forbidden keyword DROP");
    }
}
