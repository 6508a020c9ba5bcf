//! Prompt to rows: the query resolution pipeline
//!
//! Stages run strictly in order: normalization, off-topic and write-intent
//! pre-checks, embedding, semantic cache, retrieval with its confidence gate,
//! context assembly, generation, read-only execution, cache write-through.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::{CacheLookup, CacheWriter, ContextAssembler, SemanticCacheService, SqlGenerator};
use crate::domain::catalog::{CatalogRepository, LowConfidencePolicy, RetrievedExample};
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::query::{
    normalize_prompt, ExecutionError, QueryError, QueryExecutor, QueryOutcome, SqlSource,
    NO_MATCH_SUGGESTION,
};
use crate::domain::semantic_cache::CacheMatch;
use crate::domain::sql::detect_dangerous_intent;

/// Resolves natural-language prompts into executed read-only SQL
#[async_trait]
pub trait QueryServiceTrait: Send + Sync + Debug {
    async fn resolve(&self, prompt: &str) -> Result<QueryOutcome, QueryError>;
}

/// Collaborators of the pipeline
pub struct QueryPipelineDeps {
    pub catalog: Arc<dyn CatalogRepository>,
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub cache: Arc<SemanticCacheService>,
    pub cache_writer: Option<CacheWriter>,
    pub assembler: Arc<ContextAssembler>,
    pub generator: Arc<SqlGenerator>,
    pub executor: Arc<dyn QueryExecutor>,
}

pub struct QueryPipeline {
    catalog: Arc<dyn CatalogRepository>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    cache: Arc<SemanticCacheService>,
    cache_writer: Option<CacheWriter>,
    assembler: Arc<ContextAssembler>,
    generator: Arc<SqlGenerator>,
    executor: Arc<dyn QueryExecutor>,
}

impl Debug for QueryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPipeline")
            .field("cache", &self.cache)
            .field("assembler", &self.assembler)
            .field("generator", &self.generator)
            .finish()
    }
}

impl QueryPipeline {
    pub fn new(deps: QueryPipelineDeps) -> Self {
        Self {
            catalog: deps.catalog,
            embedding_provider: deps.embedding_provider,
            cache: deps.cache,
            cache_writer: deps.cache_writer,
            assembler: deps.assembler,
            generator: deps.generator,
            executor: deps.executor,
        }
    }

    pub async fn resolve(&self, prompt: &str) -> Result<QueryOutcome, QueryError> {
        let prompt = normalize_prompt(prompt);
        if prompt.is_empty() {
            return Err(QueryError::EmptyPrompt);
        }

        if self.is_absurd(&prompt).await {
            return Ok(QueryOutcome::off_topic());
        }

        if let Some(word) = detect_dangerous_intent(&prompt) {
            warn!(target: "security", prompt = %prompt, word = %word, "Rejected prompt with write intent");
            return Err(QueryError::DangerousIntent { word });
        }

        let vector = self
            .embedding_provider
            .embed_text(&prompt)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to embed prompt");
                QueryError::Embedding(e.to_string())
            })?;

        let lookup = self.cache.lookup(&vector).await;
        if let Some(ref hit) = lookup.hit {
            info!(score = hit.score, id = %hit.id, "Serving SQL from semantic cache");
            let result = self.execute(&hit.sql).await?;
            return Ok(QueryOutcome::Resolved {
                sql: hit.sql.clone(),
                source: SqlSource::Cache,
                result,
            });
        }

        let examples = match self.gate_examples(&vector, &lookup).await {
            Ok(examples) => examples,
            Err(outcome) => return Ok(outcome),
        };

        let context = self.assembler.assemble(&examples).await.map_err(|e| {
            error!(error = %e, "Schema context unavailable");
            QueryError::SchemaUnavailable(e.to_string())
        })?;

        let sql = self.generator.generate(&prompt, &context).await?;
        let result = self.execute(&sql).await?;

        if let Some(ref writer) = self.cache_writer {
            writer.enqueue(vector, prompt.as_str(), sql.as_str());
        }

        Ok(QueryOutcome::Resolved {
            sql,
            source: SqlSource::Generated,
            result,
        })
    }

    /// Lookup failures count as "not absurd"
    async fn is_absurd(&self, prompt: &str) -> bool {
        match self.catalog.matches_absurd_keyword(prompt).await {
            Ok(absurd) => absurd,
            Err(e) => {
                warn!(error = %e, "Absurd keyword check failed, continuing");
                false
            }
        }
    }

    /// Examples to ground generation on, or the ambiguity outcome that ends the request
    async fn gate_examples(
        &self,
        vector: &[f32],
        lookup: &CacheLookup,
    ) -> Result<Vec<RetrievedExample>, QueryOutcome> {
        let config = self.assembler.config();

        let examples = match self.assembler.retrieve_examples(vector).await {
            Ok(examples) => examples,
            Err(e) => {
                warn!(error = %e, "Example retrieval failed, generating zero-shot");
                return Ok(Vec::new());
            }
        };

        let Some(best) = examples.iter().map(|e| e.score).reduce(f32::max) else {
            debug!("No indexed example is similar to the prompt");
            return Err(QueryOutcome::unclear(vec![NO_MATCH_SUGGESTION.to_string()]));
        };

        if config.is_confident(best) {
            return Ok(examples);
        }

        match config.low_confidence_policy {
            LowConfidencePolicy::Clarify => {
                info!(best_score = best, "Low retrieval confidence, answering with suggestions");
                Err(QueryOutcome::unclear(build_suggestions(
                    &lookup.candidates,
                    &examples,
                    config.max_suggestions,
                )))
            }
            LowConfidencePolicy::ZeroShot => {
                info!(best_score = best, "Low retrieval confidence, generating zero-shot");
                Ok(Vec::new())
            }
        }
    }

    async fn execute(&self, sql: &str) -> Result<crate::domain::query::QueryResult, QueryError> {
        match self.executor.execute(sql).await {
            Ok(result) => {
                debug!(rows = result.row_count(), "Query executed");
                Ok(result)
            }
            Err(ExecutionError::Rejected(rejection)) => {
                warn!(target: "security", sql = %sql, reason = %rejection, "Rejected non read-only SQL");
                Err(QueryError::UnsafeSql(rejection))
            }
            Err(e) => {
                error!(error = %e, sql = %sql, "Query execution failed");
                Err(QueryError::Execution(e.to_string()))
            }
        }
    }
}

/// Clarifying questions: nearest cached prompts first, then retrieved
/// example questions, case-insensitively unique
pub fn build_suggestions(
    candidates: &[CacheMatch],
    examples: &[RetrievedExample],
    max: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();

    let suggestions: Vec<String> = candidates
        .iter()
        .map(|c| c.prompt.trim().to_string())
        .chain(examples.iter().filter_map(RetrievedExample::suggestion))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(max)
        .collect();

    if suggestions.is_empty() {
        return vec![NO_MATCH_SUGGESTION.to_string()];
    }

    suggestions
}

#[async_trait]
impl QueryServiceTrait for QueryPipeline {
    async fn resolve(&self, prompt: &str) -> Result<QueryOutcome, QueryError> {
        QueryPipeline::resolve(self, prompt).await
    }
}
