//! Texts to embed

/// One prompt embedded on the hot path, or a batch embedded during retraining.
///
/// Providers may use different endpoints for the two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingRequest {
    Single(String),
    Batch(Vec<String>),
}

impl EmbeddingRequest {
    pub fn single(text: impl Into<String>) -> Self {
        Self::Single(text.into())
    }

    pub fn batch(texts: Vec<String>) -> Self {
        Self::Batch(texts)
    }

    /// Texts in the order their vectors are returned
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Self::Single(text) => vec![text.as_str()],
            Self::Batch(texts) => texts.iter().map(String::as_str).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inputs_keep_order() {
        assert_eq!(
            EmbeddingRequest::single("jumlah nasabah").inputs(),
            vec!["jumlah nasabah"]
        );
        assert_eq!(
            EmbeddingRequest::batch(vec!["ddl".into(), "sql".into()]).inputs(),
            vec!["ddl", "sql"]
        );
        assert!(EmbeddingRequest::batch(Vec::new()).inputs().is_empty());
    }
}
