//! Semantic cache configuration

use serde::{Deserialize, Serialize};

/// Where cache entries live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Points in the vector store cache collection
    #[default]
    VectorStore,
    /// Process-local map, lost on restart
    Memory,
}

/// Configuration for semantic caching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Whether semantic caching is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Minimum similarity for a usable match (0.0 to 1.0, inclusive)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Number of nearest entries fetched per lookup
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    #[serde(default)]
    pub backend: CacheBackend,

    /// Capacity of the in-memory backend
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_similarity_threshold() -> f32 {
    0.95
}

fn default_search_limit() -> usize {
    1
}

fn default_max_entries() -> usize {
    10000
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            similarity_threshold: default_similarity_threshold(),
            search_limit: default_search_limit(),
            backend: CacheBackend::default(),
            max_entries: default_max_entries(),
        }
    }
}

impl SemanticCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn with_backend(mut self, backend: CacheBackend) -> Self {
        self.backend = backend;
        self
    }

    /// A score equal to the threshold counts as a hit
    pub fn is_hit(&self, score: f32) -> bool {
        score >= self.similarity_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SemanticCacheConfig::default();

        assert!(config.enabled);
        assert!((config.similarity_threshold - 0.95).abs() < f32::EPSILON);
        assert_eq!(config.search_limit, 1);
        assert_eq!(config.backend, CacheBackend::VectorStore);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let config = SemanticCacheConfig::new().with_similarity_threshold(0.95);

        assert!(config.is_hit(0.95));
        assert!(config.is_hit(0.99));
        assert!(!config.is_hit(0.9499));
    }

    #[test]
    fn test_similarity_threshold_clamped() {
        let config = SemanticCacheConfig::new().with_similarity_threshold(1.5);
        assert!((config.similarity_threshold - 1.0).abs() < f32::EPSILON);

        let config = SemanticCacheConfig::new().with_similarity_threshold(-0.5);
        assert!(config.similarity_threshold.abs() < f32::EPSILON);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SemanticCacheConfig =
            serde_json::from_str(r#"{"similarity_threshold": 0.9, "backend": "memory"}"#).unwrap();

        assert!(config.enabled);
        assert_eq!(config.backend, CacheBackend::Memory);
        assert_eq!(config.search_limit, 1);
    }
}
