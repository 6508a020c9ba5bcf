//! Semantic cache stored as points of a vector store collection

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::semantic_cache::{
    CacheEntry, CacheMatch, SemanticCache, GENERATION_KEY, PROMPT_KEY,
};
use crate::domain::vector_store::{PointFilter, PointSelector, VectorStore};
use crate::domain::DomainError;

/// Semantic cache whose entries live in a dedicated collection
#[derive(Debug, Clone)]
pub struct VectorStoreSemanticCache {
    store: Arc<dyn VectorStore>,
    collection: String,
    dimensions: usize,
}

impl VectorStoreSemanticCache {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>, dimensions: usize) -> Self {
        Self {
            store,
            collection: collection.into(),
            dimensions,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl SemanticCache for VectorStoreSemanticCache {
    async fn lookup(
        &self,
        vector: &[f32],
        limit: usize,
        generation: Option<&str>,
    ) -> Result<Vec<CacheMatch>, DomainError> {
        let filter = generation.map(|g| PointFilter::new().must_match(GENERATION_KEY, g));

        let hits = self
            .store
            .search(&self.collection, vector, limit, filter.as_ref())
            .await?;

        Ok(hits.iter().filter_map(CacheMatch::from_scored).collect())
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError> {
        if entry.vector().len() != self.dimensions {
            return Err(DomainError::validation(format!(
                "Cache vector has {} dimensions, collection '{}' expects {}",
                entry.vector().len(),
                self.collection,
                self.dimensions
            )));
        }

        self.store
            .upsert(&self.collection, vec![entry.into_point()])
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.store
            .delete(&self.collection, PointSelector::Ids(vec![id.to_string()]))
            .await
    }

    async fn delete_by_prompt(&self, prompt: &str) -> Result<(), DomainError> {
        let filter = PointFilter::new().must_match(PROMPT_KEY, prompt);

        self.store
            .delete(&self.collection, PointSelector::Filter(filter))
            .await
    }
}
