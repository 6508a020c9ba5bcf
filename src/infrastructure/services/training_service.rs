//! Retrieval index rebuild and correction feedback

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{ContextAssembler, SemanticCacheService};
use crate::domain::catalog::{ddl_payload, CatalogRepository, SqlExample};
use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::sql::validate_read_only;
use crate::domain::vector_store::{Distance, Payload, VectorPoint, VectorStore};
use crate::domain::DomainError;

const DEFAULT_BATCH_SIZE: usize = 50;

/// Counts of what a retrain indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrainingReport {
    pub ddl_fragments: usize,
    pub sql_examples: usize,
}

/// Whether a background retrain was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrainStatus {
    Started,
    AlreadyRunning,
}

/// Clears the running flag when a retrain ends, even on panic
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct TrainingService {
    catalog: Arc<dyn CatalogRepository>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    assembler: Arc<ContextAssembler>,
    cache: Arc<SemanticCacheService>,
    rag_collection: String,
    distance: Distance,
    batch_size: usize,
    running: Arc<AtomicBool>,
}

impl Debug for TrainingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingService")
            .field("rag_collection", &self.rag_collection)
            .field("running", &self.is_running())
            .finish()
    }
}

impl TrainingService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        assembler: Arc<ContextAssembler>,
        cache: Arc<SemanticCacheService>,
        rag_collection: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            embedding_provider,
            store,
            assembler,
            cache,
            rag_collection: rag_collection.into(),
            distance: Distance::Cosine,
            batch_size: DEFAULT_BATCH_SIZE,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn try_begin(&self) -> Option<RunningGuard> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunningGuard(self.running.clone()))
    }

    /// Rebuild the retrieval index now. Fails with a conflict if one is already running.
    pub async fn retrain(&self) -> Result<TrainingReport, DomainError> {
        let _guard = self
            .try_begin()
            .ok_or_else(|| DomainError::conflict("Retrain is already running"))?;

        self.run_training().await
    }

    /// Start a rebuild in the background unless one is in progress
    pub fn spawn_retrain(&self) -> RetrainStatus {
        let Some(guard) = self.try_begin() else {
            info!("Retrain requested while one is running");
            return RetrainStatus::AlreadyRunning;
        };

        let this = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            match this.run_training().await {
                Ok(report) => info!(
                    ddl_fragments = report.ddl_fragments,
                    sql_examples = report.sql_examples,
                    "Background retrain finished"
                ),
                Err(e) => error!(error = %e, "Background retrain failed"),
            }
        });

        RetrainStatus::Started
    }

    /// Seed the cache generation from the live schema
    pub async fn sync_generation(&self) -> Result<String, DomainError> {
        let schema = self.assembler.schema().await?;
        let generation = schema.fingerprint();
        self.cache.set_generation(generation.clone());
        Ok(generation)
    }

    async fn run_training(&self) -> Result<TrainingReport, DomainError> {
        info!(collection = %self.rag_collection, "Retrain started");

        let schema = self.catalog.load_schema().await?;
        let examples = self.catalog.list_sql_examples().await?;

        let mut documents: Vec<(String, Payload)> = schema
            .fragments()
            .into_iter()
            .map(|ddl| {
                let payload = ddl_payload(&ddl);
                (ddl, payload)
            })
            .collect();
        let ddl_fragments = documents.len();
        documents.extend(examples.iter().map(|e| (e.content(), e.payload())));

        let points = self.embed_documents(documents).await?;

        self.store
            .recreate_collection(
                &self.rag_collection,
                self.embedding_provider.dimensions(),
                self.distance,
            )
            .await?;

        for batch in points.chunks(self.batch_size) {
            self.store.upsert(&self.rag_collection, batch.to_vec()).await?;
        }

        self.assembler.invalidate_schema();
        self.cache.set_generation(schema.fingerprint());

        let report = TrainingReport {
            ddl_fragments,
            sql_examples: examples.len(),
        };
        info!(
            ddl_fragments = report.ddl_fragments,
            sql_examples = report.sql_examples,
            "Retrieval index rebuilt"
        );

        Ok(report)
    }

    async fn embed_documents(
        &self,
        documents: Vec<(String, Payload)>,
    ) -> Result<Vec<VectorPoint>, DomainError> {
        let mut points = Vec::with_capacity(documents.len());

        for batch in documents.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|(text, _)| text.clone()).collect();
            let vectors = self
                .embedding_provider
                .embed(EmbeddingRequest::batch(texts))
                .await?
                .into_vectors();

            if vectors.len() != batch.len() {
                return Err(DomainError::provider(
                    self.embedding_provider.provider_name(),
                    format!("Expected {} embeddings, got {}", batch.len(), vectors.len()),
                ));
            }

            points.extend(
                batch
                    .iter()
                    .zip(vectors)
                    .map(|((_, payload), vector)| {
                        VectorPoint::new(Uuid::new_v4().to_string(), vector, payload.clone())
                    }),
            );
        }

        Ok(points)
    }

    /// Store a corrected prompt/SQL pair as a worked example for the next retrain
    pub async fn record_correction(&self, prompt: &str, sql: &str) -> Result<(), DomainError> {
        if prompt.trim().is_empty() || sql.trim().is_empty() {
            return Err(DomainError::validation(
                "Field 'prompt_asli' dan 'sql_koreksi' wajib diisi",
            ));
        }

        validate_read_only(sql).map_err(|rejection| {
            warn!(target: "security", reason = %rejection, "Rejected unsafe SQL correction");
            DomainError::unsafe_sql(rejection.to_string())
        })?;

        self.catalog
            .add_sql_example(SqlExample::from_correction(prompt, sql))
            .await
    }
}
