//! Infrastructure services

mod cache_writer;
mod collection_admin_service;
mod context_assembler;
mod query_pipeline;
mod semantic_cache_service;
mod sql_generator;
mod training_service;

pub use cache_writer::CacheWriter;
pub use collection_admin_service::{CollectionAdminService, CollectionPoint};
pub use context_assembler::{render_examples, AssembledContext, ContextAssembler};
pub use query_pipeline::{build_suggestions, QueryPipeline, QueryPipelineDeps, QueryServiceTrait};
pub use semantic_cache_service::{CacheLookup, SemanticCacheService};
pub use sql_generator::{build_prompt, SqlGenerator};
pub use training_service::{RetrainStatus, TrainingReport, TrainingService};
