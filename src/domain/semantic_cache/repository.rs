//! Semantic cache trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::{CacheEntry, CacheMatch};
use crate::domain::DomainError;

/// Similarity-keyed store of resolved SQL
#[async_trait]
pub trait SemanticCache: Send + Sync + Debug {
    /// Nearest entries to `vector`, best first. When `generation` is given only
    /// entries tagged with it are considered.
    async fn lookup(
        &self,
        vector: &[f32],
        limit: usize,
        generation: Option<&str>,
    ) -> Result<Vec<CacheMatch>, DomainError>;

    /// Insert or replace an entry by id
    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError>;

    /// Remove an entry by id
    async fn delete(&self, id: &str) -> Result<(), DomainError>;

    /// Remove every entry whose prompt equals `prompt` exactly
    async fn delete_by_prompt(&self, prompt: &str) -> Result<(), DomainError>;
}
