//! Application state for shared services

use std::sync::Arc;

use crate::domain::DomainError;
use crate::infrastructure::services::{
    CollectionAdminService, CollectionPoint, QueryServiceTrait, RetrainStatus, TrainingService,
};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub query_service: Arc<dyn QueryServiceTrait>,
    pub training_service: Arc<dyn TrainingServiceTrait>,
    pub collection_service: Arc<dyn CollectionServiceTrait>,
}

impl AppState {
    pub fn new(
        query_service: Arc<dyn QueryServiceTrait>,
        training_service: Arc<dyn TrainingServiceTrait>,
        collection_service: Arc<dyn CollectionServiceTrait>,
    ) -> Self {
        Self {
            query_service,
            training_service,
            collection_service,
        }
    }
}

/// Trait for retrieval index training operations
#[async_trait::async_trait]
pub trait TrainingServiceTrait: Send + Sync {
    fn spawn_retrain(&self) -> RetrainStatus;
    async fn record_correction(&self, prompt: &str, sql: &str) -> Result<(), DomainError>;
}

/// Trait for cache and collection administration
#[async_trait::async_trait]
pub trait CollectionServiceTrait: Send + Sync {
    async fn inject(&self, prompt: &str, sql: &str) -> Result<String, DomainError>;
    async fn list(&self, collection: &str) -> Result<Vec<CollectionPoint>, DomainError>;
    async fn update(
        &self,
        collection: &str,
        id: &str,
        prompt: &str,
        sql: &str,
    ) -> Result<(), DomainError>;
    async fn delete(&self, collection: Option<&str>, id: &str) -> Result<String, DomainError>;
    async fn forget(&self, prompt: Option<&str>, id: Option<&str>) -> Result<(), DomainError>;
}

#[async_trait::async_trait]
impl TrainingServiceTrait for TrainingService {
    fn spawn_retrain(&self) -> RetrainStatus {
        TrainingService::spawn_retrain(self)
    }

    async fn record_correction(&self, prompt: &str, sql: &str) -> Result<(), DomainError> {
        TrainingService::record_correction(self, prompt, sql).await
    }
}

#[async_trait::async_trait]
impl CollectionServiceTrait for CollectionAdminService {
    async fn inject(&self, prompt: &str, sql: &str) -> Result<String, DomainError> {
        CollectionAdminService::inject(self, prompt, sql).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<CollectionPoint>, DomainError> {
        CollectionAdminService::list(self, collection).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        prompt: &str,
        sql: &str,
    ) -> Result<(), DomainError> {
        CollectionAdminService::update(self, collection, id, prompt, sql).await
    }

    async fn delete(&self, collection: Option<&str>, id: &str) -> Result<String, DomainError> {
        CollectionAdminService::delete(self, collection, id).await
    }

    async fn forget(&self, prompt: Option<&str>, id: Option<&str>) -> Result<(), DomainError> {
        CollectionAdminService::forget(self, prompt, id).await
    }
}
