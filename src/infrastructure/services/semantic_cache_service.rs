//! Semantic SQL cache service
//!
//! Wraps a [`SemanticCache`] with the hit policy, the current schema
//! generation and the admin write paths (manual injection, correction,
//! forgetting).

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::domain::embedding::EmbeddingProvider;
use crate::domain::query::normalize_prompt;
use crate::domain::semantic_cache::{CacheEntry, CacheMatch, SemanticCache, SemanticCacheConfig};
use crate::domain::sql::validate_read_only;
use crate::domain::DomainError;

/// Number of nearest entries kept as suggestion candidates
const DEFAULT_CANDIDATE_LIMIT: usize = 5;

/// Result of a cache lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheLookup {
    /// Best entry at or above the similarity threshold
    pub hit: Option<CacheMatch>,
    /// Nearest entries regardless of threshold, best first
    pub candidates: Vec<CacheMatch>,
}

impl CacheLookup {
    pub fn miss() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub struct SemanticCacheService {
    cache: Arc<dyn SemanticCache>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    config: SemanticCacheConfig,
    candidate_limit: usize,
    generation: RwLock<String>,
}

impl SemanticCacheService {
    pub fn new(
        cache: Arc<dyn SemanticCache>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        config: SemanticCacheConfig,
    ) -> Self {
        Self {
            cache,
            embedding_provider,
            config,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            generation: RwLock::new(String::new()),
        }
    }

    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    /// Schema generation new entries are tagged with and lookups are restricted to
    pub fn generation(&self) -> String {
        self.generation
            .read()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    pub fn set_generation(&self, generation: impl Into<String>) {
        let generation = generation.into();
        if let Ok(mut current) = self.generation.write() {
            if *current != generation {
                info!(generation = %generation, "Semantic cache generation rotated");
            }
            *current = generation;
        }
    }

    /// Find the nearest cached SQL. Failures degrade to a miss.
    pub async fn lookup(&self, vector: &[f32]) -> CacheLookup {
        if !self.config.enabled {
            return CacheLookup::miss();
        }

        let limit = self.config.search_limit.max(self.candidate_limit).max(1);
        let generation = self.generation();

        let candidates = match self.cache.lookup(vector, limit, Some(&generation)).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(error = %e, "Semantic cache lookup failed, treating as miss");
                return CacheLookup::miss();
            }
        };

        let hit = candidates
            .iter()
            .take(self.config.search_limit.max(1))
            .find(|m| self.config.is_hit(m.score))
            .cloned();

        match hit {
            Some(ref m) => debug!(score = m.score, id = %m.id, "Semantic cache hit"),
            None => debug!(
                best = candidates.first().map(|m| m.score),
                "Semantic cache miss"
            ),
        }

        CacheLookup { hit, candidates }
    }

    /// Store a resolved prompt under the current generation
    pub async fn store(&self, vector: Vec<f32>, prompt: &str, sql: &str) -> Result<String, DomainError> {
        let entry = CacheEntry::new(vector, prompt, sql, self.generation())?;
        let id = entry.id().to_string();

        self.cache.upsert(entry).await?;
        debug!(id = %id, "Stored SQL in semantic cache");

        Ok(id)
    }

    /// Manually add a prompt/SQL pair. The SQL is validated before anything is embedded.
    pub async fn inject(&self, prompt: &str, sql: &str) -> Result<String, DomainError> {
        let prompt = normalize_prompt(prompt);
        if prompt.is_empty() || sql.trim().is_empty() {
            return Err(DomainError::validation("Prompt dan SQL wajib diisi"));
        }

        Self::require_read_only(sql)?;

        let vector = self.embedding_provider.embed_text(&prompt).await?;
        let id = self.store(vector, &prompt, sql).await?;

        info!(id = %id, prompt = %prompt, "Cache entry injected");
        Ok(id)
    }

    /// Replace the prompt and SQL of an existing entry
    pub async fn update(&self, id: &str, prompt: &str, sql: &str) -> Result<(), DomainError> {
        Self::require_read_only(sql)?;

        let prompt = normalize_prompt(prompt);
        let vector = self.embedding_provider.embed_text(&prompt).await?;
        let entry = CacheEntry::with_id(id, vector, prompt, sql, self.generation())?;

        self.cache.upsert(entry).await?;
        info!(id = %id, "Cache entry updated");

        Ok(())
    }

    /// Remove every entry stored for this prompt
    pub async fn forget_prompt(&self, prompt: &str) -> Result<(), DomainError> {
        let prompt = normalize_prompt(prompt);
        if prompt.is_empty() {
            return Err(DomainError::validation("Prompt wajib diisi"));
        }

        self.cache.delete_by_prompt(&prompt).await?;
        info!(prompt = %prompt, "Cache entries forgotten");

        Ok(())
    }

    pub async fn forget_id(&self, id: &str) -> Result<(), DomainError> {
        self.cache.delete(id).await?;
        info!(id = %id, "Cache entry forgotten");

        Ok(())
    }

    fn require_read_only(sql: &str) -> Result<(), DomainError> {
        validate_read_only(sql).map_err(|rejection| {
            warn!(target: "security", reason = %rejection, "Rejected unsafe SQL for the semantic cache");
            DomainError::unsafe_sql(rejection.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::infrastructure::semantic_cache::InMemorySemanticCache;

    fn service() -> (SemanticCacheService, Arc<MockEmbeddingProvider>) {
        let embedder = Arc::new(MockEmbeddingProvider::new("mock", 8));
        let service = SemanticCacheService::new(
            Arc::new(InMemorySemanticCache::new(100)),
            embedder.clone(),
            SemanticCacheConfig::default(),
        );
        service.set_generation("g1");
        (service, embedder)
    }

    #[tokio::test]
    async fn test_round_trip_identical_vector_hits() {
        let (service, embedder) = service();
        let vector = embedder.embed_text("jumlah nasabah").await.unwrap();

        service
            .store(vector.clone(), "jumlah nasabah", "SELECT COUNT(*) FROM nasabah")
            .await
            .unwrap();
        let lookup = service.lookup(&vector).await;

        let hit = lookup.hit.unwrap();
        assert_eq!(hit.sql, "SELECT COUNT(*) FROM nasabah");
        assert!((hit.score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_below_threshold_is_candidate_only() {
        let (service, _) = service();
        service.store(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], "a", "SELECT 1").await.unwrap();

        let lookup = service.lookup(&[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]).await;

        assert!(lookup.hit.is_none());
        assert_eq!(lookup.candidates.len(), 1);
        assert_eq!(lookup.candidates[0].prompt, "a");
    }

    #[tokio::test]
    async fn test_generation_rotation_hides_old_entries() {
        let (service, embedder) = service();
        let vector = embedder.embed_text("p").await.unwrap();
        service.store(vector.clone(), "p", "SELECT 1").await.unwrap();

        service.set_generation("g2");

        assert_eq!(service.lookup(&vector).await, CacheLookup::miss());
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let embedder = Arc::new(MockEmbeddingProvider::new("mock", 8));
        let service = SemanticCacheService::new(
            Arc::new(InMemorySemanticCache::new(10)),
            embedder.clone(),
            SemanticCacheConfig::default().with_enabled(false),
        );
        let vector = embedder.embed_text("p").await.unwrap();
        service.store(vector.clone(), "p", "SELECT 1").await.unwrap();

        assert!(service.lookup(&vector).await.hit.is_none());
    }

    #[tokio::test]
    async fn test_inject_rejects_unsafe_sql_before_embedding() {
        let (service, embedder) = service();

        let result = service.inject("X", "DROP TABLE nasabah").await;

        assert!(matches!(result, Err(DomainError::UnsafeSql { .. })));
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_inject_normalizes_prompt() {
        let (service, embedder) = service();

        service
            .inject("  Total Saldo  ", "SELECT SUM(saldo) FROM rekening")
            .await
            .unwrap();

        let vector = embedder.embed_text("total saldo").await.unwrap();
        let hit = service.lookup(&vector).await.hit.unwrap();
        assert_eq!(hit.prompt, "total saldo");
    }

    #[tokio::test]
    async fn test_inject_requires_fields() {
        let (service, _) = service();

        assert!(matches!(
            service.inject(" ", "SELECT 1").await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            service.inject("p", "").await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_and_forget() {
        let (service, embedder) = service();
        let id = service.inject("p", "SELECT 1").await.unwrap();

        service.update(&id, "p", "SELECT 2").await.unwrap();
        let vector = embedder.embed_text("p").await.unwrap();
        assert_eq!(service.lookup(&vector).await.hit.unwrap().sql, "SELECT 2");

        service.forget_prompt("P").await.unwrap();
        assert!(service.lookup(&vector).await.hit.is_none());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_miss() {
        let embedder = Arc::new(MockEmbeddingProvider::new("mock", 2));
        let store = Arc::new(crate::infrastructure::vector_store::InMemoryVectorStore::new());
        let cache = crate::infrastructure::semantic_cache::VectorStoreSemanticCache::new(
            store,
            "missing_collection",
            2,
        );
        let service = SemanticCacheService::new(Arc::new(cache), embedder, SemanticCacheConfig::default());

        assert_eq!(service.lookup(&[1.0, 0.0]).await, CacheLookup::miss());
    }
}
