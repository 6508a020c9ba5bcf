//! Administration of the cache and retrieval collections

use std::fmt::Debug;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::SemanticCacheService;
use crate::domain::catalog::SqlExample;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::sql::validate_read_only;
use crate::domain::vector_store::{Payload, PointSelector, VectorPoint, VectorStore};
use crate::domain::DomainError;

const DEFAULT_LIST_LIMIT: usize = 100;

/// Stored point as shown to operators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionPoint {
    pub id: String,
    pub payload: Payload,
}

/// Which managed collection a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManagedCollection {
    Cache,
    Rag,
}

#[derive(Debug)]
pub struct CollectionAdminService {
    store: Arc<dyn VectorStore>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    cache: Arc<SemanticCacheService>,
    cache_collection: String,
    rag_collection: String,
    list_limit: usize,
}

impl CollectionAdminService {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        cache: Arc<SemanticCacheService>,
        cache_collection: impl Into<String>,
        rag_collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            embedding_provider,
            cache,
            cache_collection: cache_collection.into(),
            rag_collection: rag_collection.into(),
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit.max(1);
        self
    }

    pub fn cache_collection(&self) -> &str {
        &self.cache_collection
    }

    fn managed(&self, collection: &str) -> Option<ManagedCollection> {
        if collection == self.cache_collection {
            Some(ManagedCollection::Cache)
        } else if collection == self.rag_collection {
            Some(ManagedCollection::Rag)
        } else {
            None
        }
    }

    /// Manually add a cache entry under the current generation
    pub async fn inject(&self, prompt: &str, sql: &str) -> Result<String, DomainError> {
        self.cache.inject(prompt, sql).await
    }

    /// Payloads of the first `list_limit` points of a collection
    pub async fn list(&self, collection: &str) -> Result<Vec<CollectionPoint>, DomainError> {
        let collection = collection.trim();
        if collection.is_empty() {
            return Err(DomainError::validation("Parameter 'collection' wajib diisi"));
        }

        let points = self.store.scroll(collection, self.list_limit).await?;

        Ok(points
            .into_iter()
            .map(|point| CollectionPoint {
                id: point.id,
                payload: point.payload,
            })
            .collect())
    }

    /// Replace a point's prompt and SQL, re-embedding it in place
    pub async fn update(
        &self,
        collection: &str,
        id: &str,
        prompt: &str,
        sql: &str,
    ) -> Result<(), DomainError> {
        if [collection, id, prompt, sql].iter().any(|v| v.trim().is_empty()) {
            return Err(DomainError::validation(
                "Field 'collection', 'id', 'prompt', dan 'sql' wajib diisi semua",
            ));
        }

        validate_read_only(sql).map_err(|rejection| {
            warn!(
                target: "security",
                collection = %collection,
                id = %id,
                reason = %rejection,
                "Rejected unsafe SQL in point update"
            );
            DomainError::unsafe_sql(rejection.to_string())
        })?;

        match self.managed(collection) {
            Some(ManagedCollection::Cache) => self.cache.update(id, prompt, sql).await,
            Some(ManagedCollection::Rag) => {
                let example = SqlExample::from_correction(prompt, sql);
                let vector = self.embedding_provider.embed_text(&example.content()).await?;

                self.store
                    .upsert(
                        collection,
                        vec![VectorPoint::new(id, vector, example.payload())],
                    )
                    .await?;
                info!(collection = %collection, id = %id, "Retrieval example updated");

                Ok(())
            }
            None => Err(DomainError::validation(format!(
                "Collection '{}' tidak dikenal",
                collection
            ))),
        }
    }

    /// Delete a point by id, defaulting to the cache collection. Returns the collection used.
    pub async fn delete(&self, collection: Option<&str>, id: &str) -> Result<String, DomainError> {
        if id.trim().is_empty() {
            return Err(DomainError::validation("Field 'id' wajib diisi"));
        }

        let collection = collection
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.cache_collection)
            .to_string();

        if self.managed(&collection) == Some(ManagedCollection::Cache) {
            self.cache.forget_id(id).await?;
        } else {
            self.store
                .delete(&collection, PointSelector::Ids(vec![id.to_string()]))
                .await?;
            info!(collection = %collection, id = %id, "Point deleted");
        }

        Ok(collection)
    }

    /// Forget cache entries by exact prompt or by id
    pub async fn forget(&self, prompt: Option<&str>, id: Option<&str>) -> Result<(), DomainError> {
        let prompt = prompt.map(str::trim).filter(|p| !p.is_empty());
        let id = id.map(str::trim).filter(|i| !i.is_empty());

        match (prompt, id) {
            (Some(prompt), _) => self.cache.forget_prompt(prompt).await,
            (None, Some(id)) => self.cache.forget_id(id).await,
            (None, None) => Err(DomainError::validation("Field 'prompt' atau 'id' wajib diisi")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{CATEGORY_KEY, CONTENT_KEY, PREVIEW_KEY};
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::semantic_cache::{SemanticCacheConfig, PROMPT_KEY, SQL_KEY};
    use crate::domain::vector_store::Distance;
    use crate::infrastructure::semantic_cache::VectorStoreSemanticCache;
    use crate::infrastructure::vector_store::InMemoryVectorStore;

    const CACHE: &str = "ledger_cache";
    const RAG: &str = "ledger_rag";

    fn payload_text<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
        payload.get(key).and_then(serde_json::Value::as_str)
    }

    async fn service() -> (CollectionAdminService, Arc<InMemoryVectorStore>, Arc<SemanticCacheService>) {
        let store = Arc::new(InMemoryVectorStore::new());
        store.ensure_collection(CACHE, 4, Distance::Cosine).await.unwrap();
        store.ensure_collection(RAG, 4, Distance::Cosine).await.unwrap();

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockEmbeddingProvider::new("mock", 4));
        let cache = Arc::new(SemanticCacheService::new(
            Arc::new(VectorStoreSemanticCache::new(store.clone(), CACHE, 4)),
            embedder.clone(),
            SemanticCacheConfig::default(),
        ));

        let service = CollectionAdminService::new(store.clone(), embedder, cache.clone(), CACHE, RAG)
            .with_list_limit(10);

        (service, store, cache)
    }

    #[tokio::test]
    async fn test_list_requires_collection() {
        let (service, _, _) = service().await;

        assert!(matches!(service.list(" ").await, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_list_returns_payloads() {
        let (service, _, cache) = service().await;
        let id = cache.inject("jumlah nasabah", "SELECT COUNT(*) FROM nasabah").await.unwrap();

        let points = service.list(CACHE).await.unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, id);
        assert_eq!(payload_text(&points[0].payload, PROMPT_KEY), Some("jumlah nasabah"));
    }

    #[tokio::test]
    async fn test_update_cache_point() {
        let (service, _, cache) = service().await;
        let id = cache.inject("jumlah nasabah", "SELECT 1").await.unwrap();

        service
            .update(CACHE, &id, "jumlah nasabah", "SELECT COUNT(*) FROM nasabah")
            .await
            .unwrap();

        let points = service.list(CACHE).await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(
            payload_text(&points[0].payload, SQL_KEY),
            Some("SELECT COUNT(*) FROM nasabah")
        );
    }

    #[tokio::test]
    async fn test_update_rag_point() {
        let (service, _, _) = service().await;

        service
            .update(RAG, "7", "saldo terbanyak", "SELECT nama FROM nasabah")
            .await
            .unwrap();

        let points = service.list(RAG).await.unwrap();
        assert_eq!(points[0].id, "7");
        assert_eq!(payload_text(&points[0].payload, CATEGORY_KEY), Some("sql"));
        assert_eq!(payload_text(&points[0].payload, PREVIEW_KEY), Some("saldo terbanyak"));
        assert!(payload_text(&points[0].payload, CONTENT_KEY)
            .unwrap()
            .ends_with("SELECT nama FROM nasabah"));
    }

    #[tokio::test]
    async fn test_update_rejects_unsafe_sql_and_unknown_collection() {
        let (service, store, _) = service().await;

        assert!(matches!(
            service.update(RAG, "1", "hapus", "DROP TABLE nasabah").await,
            Err(DomainError::UnsafeSql { .. })
        ));
        assert!(matches!(
            service.update("other", "1", "q", "SELECT 1").await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            service.update(CACHE, "", "q", "SELECT 1").await,
            Err(DomainError::Validation { .. })
        ));
        assert_eq!(store.point_count(RAG), Some(0));
    }

    #[tokio::test]
    async fn test_delete_defaults_to_cache_collection() {
        let (service, store, cache) = service().await;
        let id = cache.inject("jumlah nasabah", "SELECT 1").await.unwrap();

        let collection = service.delete(None, &id).await.unwrap();

        assert_eq!(collection, CACHE);
        assert_eq!(store.point_count(CACHE), Some(0));
    }

    #[tokio::test]
    async fn test_delete_from_rag_collection() {
        let (service, store, _) = service().await;
        service.update(RAG, "3", "q", "SELECT 1").await.unwrap();

        let collection = service.delete(Some(RAG), "3").await.unwrap();

        assert_eq!(collection, RAG);
        assert_eq!(store.point_count(RAG), Some(0));
    }

    #[tokio::test]
    async fn test_forget_by_prompt() {
        let (service, store, cache) = service().await;
        cache.inject("Jumlah Nasabah ", "SELECT 1").await.unwrap();
        cache.inject("saldo", "SELECT 2").await.unwrap();

        service.forget(Some("jumlah nasabah"), None).await.unwrap();

        assert_eq!(store.point_count(CACHE), Some(1));
        assert!(matches!(service.forget(None, Some(" ")).await, Err(DomainError::Validation { .. })));
    }
}
