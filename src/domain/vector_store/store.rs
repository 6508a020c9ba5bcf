//! Vector store trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{Distance, PointFilter, PointSelector, ScoredPoint, StoredPoint, VectorPoint};
use crate::domain::DomainError;

/// Collection-oriented vector similarity store
#[async_trait]
pub trait VectorStore: Send + Sync + Debug {
    /// Create the collection if it does not exist. Returns true when it was created.
    async fn ensure_collection(
        &self,
        collection: &str,
        dimensions: usize,
        distance: Distance,
    ) -> Result<bool, DomainError>;

    /// Drop the collection (if present) and create it empty
    async fn recreate_collection(
        &self,
        collection: &str,
        dimensions: usize,
        distance: Distance,
    ) -> Result<(), DomainError>;

    /// Insert or replace points by id
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<(), DomainError>;

    /// Nearest neighbours of `vector`, best first
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&PointFilter>,
    ) -> Result<Vec<ScoredPoint>, DomainError>;

    /// List stored points with their payload
    async fn scroll(&self, collection: &str, limit: usize) -> Result<Vec<StoredPoint>, DomainError>;

    /// Delete the selected points
    async fn delete(&self, collection: &str, selector: PointSelector) -> Result<(), DomainError>;
}
