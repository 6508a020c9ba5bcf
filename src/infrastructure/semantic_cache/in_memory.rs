//! In-memory semantic cache implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::embedding::cosine_similarity;
use crate::domain::semantic_cache::{CacheEntry, CacheMatch, SemanticCache};
use crate::domain::DomainError;

/// In-memory semantic cache using linear search
///
/// Entries are lost on restart. Suitable for development and single-node
/// deployments with a small cache.
#[derive(Debug)]
pub struct InMemorySemanticCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    max_entries: usize,
    evictions: AtomicU64,
}

impl InMemorySemanticCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: max_entries.max(1),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Evict oldest entries if cache is full
    fn evict_if_needed(&self, entries: &mut HashMap<String, CacheEntry>) {
        while entries.len() >= self.max_entries {
            let Some(oldest_id) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.created_at())
                .map(|(id, _)| id.clone())
            else {
                return;
            };

            entries.remove(&oldest_id);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl SemanticCache for InMemorySemanticCache {
    async fn lookup(
        &self,
        vector: &[f32],
        limit: usize,
        generation: Option<&str>,
    ) -> Result<Vec<CacheMatch>, DomainError> {
        let entries = self.entries.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut results: Vec<CacheMatch> = entries
            .values()
            .filter(|entry| generation.is_none_or(|g| entry.generation() == g))
            .map(|entry| CacheMatch {
                id: entry.id().to_string(),
                prompt: entry.prompt().to_string(),
                sql: entry.sql().to_string(),
                score: cosine_similarity(vector, entry.vector()),
            })
            .collect();

        // Sort by similarity descending
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        if !entries.contains_key(entry.id()) {
            self.evict_if_needed(&mut entries);
        }
        entries.insert(entry.id().to_string(), entry);

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        entries.remove(id);
        Ok(())
    }

    async fn delete_by_prompt(&self, prompt: &str) -> Result<(), DomainError> {
        let mut entries = self.entries.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        entries.retain(|_, entry| entry.prompt() != prompt);
        Ok(())
    }
}
