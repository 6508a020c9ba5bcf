//! Ledger SQL Gateway
//!
//! Answers natural-language questions about a banking ledger with read-only SQL:
//! - Semantic cache of previously resolved questions
//! - Retrieval of schema, lookup tables and worked examples
//! - Local-then-cloud LLM fallback for SQL generation
//! - Read-only execution with a statement timeout

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use api::state::AppState;
use domain::catalog::CatalogRepository;
use domain::embedding::EmbeddingProvider;
use domain::semantic_cache::{CacheBackend, SemanticCache};
use domain::vector_store::VectorStore;
use infrastructure::{
    catalog::PostgresCatalogRepository,
    database::connect_pool,
    embedding::GeminiEmbeddingProvider,
    executor::PostgresQueryExecutor,
    llm::{HttpClient, LlmProviderFactory},
    semantic_cache::{InMemorySemanticCache, VectorStoreSemanticCache},
    services::{
        CacheWriter, CollectionAdminService, ContextAssembler, QueryPipeline, QueryPipelineDeps,
        SemanticCacheService, SqlGenerator, TrainingService,
    },
    vector_store::QdrantVectorStore,
};

/// Fully wired services of a running gateway
pub struct AppServices {
    pub query_pipeline: Arc<QueryPipeline>,
    pub training_service: Arc<TrainingService>,
    pub collection_service: Arc<CollectionAdminService>,
    pub cache_writer: CacheWriter,
    pub cache_writer_task: JoinHandle<()>,
}

impl AppServices {
    pub fn state(&self) -> AppState {
        AppState::new(
            self.query_pipeline.clone(),
            self.training_service.clone(),
            self.collection_service.clone(),
        )
    }

    /// Wait for queued cache writes, then stop the writer
    pub async fn shutdown(self) {
        self.cache_writer.flush().await;
        self.cache_writer_task.abort();
    }
}

/// Connect every backend and build the services
pub async fn create_app_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let schema = config
        .database
        .schema_name()
        .context("database schema is not configured")?;

    let pool = connect_pool(&config.database).await?;

    let catalog: Arc<dyn CatalogRepository> = Arc::new(PostgresCatalogRepository::new(
        pool.clone(),
        schema.clone(),
        config.reference_tables.clone(),
    )?);

    let embedding = &config.embedding;
    let embedding_provider: Arc<dyn EmbeddingProvider> = Arc::new(GeminiEmbeddingProvider::new(
        HttpClient::with_timeout(Duration::from_secs(embedding.timeout_secs))?,
        embedding.api_key.clone(),
        embedding.base_url.clone(),
        embedding.model.clone(),
        embedding.dimensions,
    ));

    let vs = &config.vector_store;
    let store: Arc<dyn VectorStore> = Arc::new(QdrantVectorStore::new(
        HttpClient::with_timeout(Duration::from_secs(vs.timeout_secs))?,
        vs.url.clone(),
        vs.api_key.clone(),
    ));

    bootstrap_collections(config, store.as_ref()).await?;

    let cache: Arc<dyn SemanticCache> = match config.cache.backend {
        CacheBackend::VectorStore => Arc::new(VectorStoreSemanticCache::new(
            store.clone(),
            vs.cache_collection.clone(),
            embedding.dimensions,
        )),
        CacheBackend::Memory => Arc::new(InMemorySemanticCache::new(config.cache.max_entries)),
    };

    let cache_service = Arc::new(SemanticCacheService::new(
        cache,
        embedding_provider.clone(),
        config.cache.clone(),
    ));
    let (cache_writer, cache_writer_task) = CacheWriter::spawn(cache_service.clone());

    let assembler = Arc::new(ContextAssembler::new(
        catalog.clone(),
        store.clone(),
        vs.rag_collection.clone(),
        config.rag.clone(),
    ));

    let generator = Arc::new(
        SqlGenerator::new(LlmProviderFactory::create_chain(&config.llm)?)
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens),
    );

    let executor = Arc::new(PostgresQueryExecutor::new(
        pool,
        Duration::from_secs(config.query.timeout_secs),
    ));

    let training_service = Arc::new(
        TrainingService::new(
            catalog.clone(),
            embedding_provider.clone(),
            store.clone(),
            assembler.clone(),
            cache_service.clone(),
            vs.rag_collection.clone(),
        )
        .with_distance(vs.distance),
    );

    match training_service.sync_generation().await {
        Ok(generation) => info!(generation = %generation, "Semantic cache generation set"),
        Err(e) => warn!(error = %e, "Could not read schema at startup, cache generation left empty"),
    }

    let query_pipeline = Arc::new(QueryPipeline::new(QueryPipelineDeps {
        catalog,
        embedding_provider: embedding_provider.clone(),
        cache: cache_service.clone(),
        cache_writer: Some(cache_writer.clone()),
        assembler,
        generator,
        executor,
    }));

    let collection_service = Arc::new(
        CollectionAdminService::new(
            store,
            embedding_provider,
            cache_service,
            vs.cache_collection.clone(),
            vs.rag_collection.clone(),
        )
        .with_list_limit(vs.list_limit),
    );

    info!(schema = %schema, "Services initialized");

    Ok(AppServices {
        query_pipeline,
        training_service,
        collection_service,
        cache_writer,
        cache_writer_task,
    })
}

/// Create the cache and retrieval collections when missing
async fn bootstrap_collections(config: &AppConfig, store: &dyn VectorStore) -> anyhow::Result<()> {
    let vs = &config.vector_store;
    let dimensions = config.embedding.dimensions;

    if config.cache.backend == CacheBackend::VectorStore {
        let created = store
            .ensure_collection(&vs.cache_collection, dimensions, vs.distance)
            .await?;
        info!(collection = %vs.cache_collection, created, "Cache collection ready");
    }

    let created = store
        .ensure_collection(&vs.rag_collection, dimensions, vs.distance)
        .await?;
    info!(collection = %vs.rag_collection, created, "Retrieval collection ready");

    Ok(())
}
