//! In-memory vector store implementation

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::embedding::cosine_similarity;
use crate::domain::vector_store::{
    Distance, PointFilter, PointSelector, ScoredPoint, StoredPoint, VectorPoint, VectorStore,
};
use crate::domain::DomainError;

#[derive(Debug)]
struct Collection {
    dimensions: usize,
    distance: Distance,
    points: HashMap<String, VectorPoint>,
}

impl Collection {
    fn new(dimensions: usize, distance: Distance) -> Self {
        Self {
            dimensions,
            distance,
            points: HashMap::new(),
        }
    }

    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.distance {
            Distance::Cosine => cosine_similarity(a, b),
            Distance::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
            Distance::Euclid => -a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

/// Vector store using linear search over process-local collections
///
/// Suitable for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points in a collection, if it exists
    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .ok()?
            .get(collection)
            .map(|c| c.points.len())
    }

    fn missing(collection: &str) -> DomainError {
        DomainError::vector_store(format!("Collection '{}' not found", collection))
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(
        &self,
        collection: &str,
        dimensions: usize,
        distance: Distance,
    ) -> Result<bool, DomainError> {
        let mut collections = self.collections.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        if collections.contains_key(collection) {
            return Ok(false);
        }

        collections.insert(collection.to_string(), Collection::new(dimensions, distance));
        Ok(true)
    }

    async fn recreate_collection(
        &self,
        collection: &str,
        dimensions: usize,
        distance: Distance,
    ) -> Result<(), DomainError> {
        let mut collections = self.collections.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        collections.insert(collection.to_string(), Collection::new(dimensions, distance));
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<(), DomainError> {
        let mut collections = self.collections.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        let target = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing(collection))?;

        if let Some(bad) = points.iter().find(|p| p.vector.len() != target.dimensions) {
            return Err(DomainError::vector_store(format!(
                "Vector dimension error: expected dim: {}, got {}",
                target.dimensions,
                bad.vector.len()
            )));
        }

        for point in points {
            target.points.insert(point.id.clone(), point);
        }

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&PointFilter>,
    ) -> Result<Vec<ScoredPoint>, DomainError> {
        let collections = self.collections.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        let target = collections
            .get(collection)
            .ok_or_else(|| Self::missing(collection))?;

        let mut results: Vec<ScoredPoint> = target
            .points
            .values()
            .filter(|p| filter.is_none_or(|f| f.matches(&p.payload)))
            .map(|p| ScoredPoint {
                id: p.id.clone(),
                score: target.score(vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn scroll(&self, collection: &str, limit: usize) -> Result<Vec<StoredPoint>, DomainError> {
        let collections = self.collections.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        let target = collections
            .get(collection)
            .ok_or_else(|| Self::missing(collection))?;

        let mut points: Vec<StoredPoint> = target
            .points
            .values()
            .map(|p| StoredPoint {
                id: p.id.clone(),
                payload: p.payload.clone(),
            })
            .collect();

        points.sort_by(|a, b| a.id.cmp(&b.id));
        points.truncate(limit);

        Ok(points)
    }

    async fn delete(&self, collection: &str, selector: PointSelector) -> Result<(), DomainError> {
        let mut collections = self.collections.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        let target = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing(collection))?;

        match selector {
            PointSelector::Ids(ids) => {
                for id in ids {
                    target.points.remove(&id);
                }
            }
            PointSelector::Filter(filter) => {
                target.points.retain(|_, p| !filter.matches(&p.payload));
            }
        }

        Ok(())
    }
}
