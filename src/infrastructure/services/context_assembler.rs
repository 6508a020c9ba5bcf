//! Grounding context for SQL generation
//!
//! The schema is mandatory and cached at process scope until invalidated.
//! Reference data and the business dictionary are fetched per request and
//! degrade to empty text on failure.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::domain::catalog::{
    CatalogRepository, RagConfig, RetrievedExample, SchemaContext, CATEGORY_KEY,
};
use crate::domain::vector_store::{PointFilter, VectorStore};
use crate::domain::DomainError;

const EXAMPLES_HEADER: &str = "Most relevant DDL and SQL examples (follow these patterns):\n";

/// Everything the generator is grounded on for one request
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub schema: Arc<SchemaContext>,
    pub reference_data: String,
    pub dictionary: String,
    pub examples: String,
}

pub struct ContextAssembler {
    catalog: Arc<dyn CatalogRepository>,
    store: Arc<dyn VectorStore>,
    rag_collection: String,
    config: RagConfig,
    schema_cache: RwLock<Option<Arc<SchemaContext>>>,
}

impl Debug for ContextAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextAssembler")
            .field("rag_collection", &self.rag_collection)
            .field("config", &self.config)
            .finish()
    }
}

impl ContextAssembler {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        store: Arc<dyn VectorStore>,
        rag_collection: impl Into<String>,
        config: RagConfig,
    ) -> Self {
        Self {
            catalog,
            store,
            rag_collection: rag_collection.into(),
            config,
            schema_cache: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Live schema, loaded once and reused until [`Self::invalidate_schema`]
    pub async fn schema(&self) -> Result<Arc<SchemaContext>, DomainError> {
        if let Some(schema) = self.schema_cache.read().ok().and_then(|s| s.clone()) {
            return Ok(schema);
        }

        let schema = Arc::new(self.catalog.load_schema().await?);

        if let Ok(mut cached) = self.schema_cache.write() {
            *cached = Some(schema.clone());
        }

        Ok(schema)
    }

    pub fn invalidate_schema(&self) {
        if let Ok(mut cached) = self.schema_cache.write() {
            *cached = None;
        }
        debug!("Schema cache invalidated");
    }

    /// Nearest worked examples, best first
    pub async fn retrieve_examples(
        &self,
        vector: &[f32],
    ) -> Result<Vec<RetrievedExample>, DomainError> {
        let filter = PointFilter::new().must_match(CATEGORY_KEY, self.config.category.as_str());

        let hits = self
            .store
            .search(&self.rag_collection, vector, self.config.search_limit, Some(&filter))
            .await?;

        Ok(hits.iter().filter_map(RetrievedExample::from_scored).collect())
    }

    /// Build the generation context. Only a schema failure is an error.
    pub async fn assemble(
        &self,
        examples: &[RetrievedExample],
    ) -> Result<AssembledContext, DomainError> {
        let schema = self.schema().await?;

        let reference_data = match self.catalog.load_reference_data().await {
            Ok(data) => data.render(),
            Err(e) => {
                warn!(error = %e, "Reference data unavailable");
                String::new()
            }
        };

        let dictionary = match self.catalog.load_business_dictionary().await {
            Ok(dictionary) => dictionary.render(),
            Err(e) => {
                warn!(error = %e, "Business dictionary unavailable");
                String::new()
            }
        };

        Ok(AssembledContext {
            schema,
            reference_data,
            dictionary,
            examples: render_examples(examples),
        })
    }
}

/// Retrieved content blocks, each at most once
pub fn render_examples(examples: &[RetrievedExample]) -> String {
    let mut seen = HashSet::new();
    let mut text = String::new();

    for example in examples {
        if example.content.trim().is_empty() || !seen.insert(example.content.as_str()) {
            continue;
        }
        text.push_str(&example.content);
        text.push_str("\n---\n");
    }

    if text.is_empty() {
        return text;
    }

    format!("{}{}", EXAMPLES_HEADER, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{
        ddl_payload, BusinessDictionary, BusinessTerm, ColumnDefinition, ExampleCategory,
        MockCatalogRepository, ReferenceData, ReferenceSection, SqlExample, TableDdl,
    };
    use crate::domain::vector_store::{Distance, VectorPoint};
    use crate::infrastructure::vector_store::InMemoryVectorStore;

    fn schema() -> SchemaContext {
        SchemaContext::new(
            "bank",
            vec![TableDdl::new("nasabah").with_column(ColumnDefinition::new("nama_lengkap", "text"))],
        )
    }

    fn example(content: &str) -> RetrievedExample {
        RetrievedExample {
            content: content.to_string(),
            preview: None,
            score: 0.9,
            category: Some(ExampleCategory::Sql),
        }
    }

    fn assembler(catalog: MockCatalogRepository) -> ContextAssembler {
        ContextAssembler::new(
            Arc::new(catalog),
            Arc::new(InMemoryVectorStore::new()),
            "ledger_rag",
            RagConfig::default(),
        )
    }

    #[test]
    fn test_render_examples_deduplicates() {
        let text = render_examples(&[example("A"), example("B"), example("A")]);

        assert_eq!(
            text,
            format!("{}A\n---\nB\n---\n", EXAMPLES_HEADER)
        );
    }

    #[test]
    fn test_render_examples_empty() {
        assert_eq!(render_examples(&[]), "");
    }

    #[tokio::test]
    async fn test_assemble_soft_fails_optional_parts() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_load_schema().returning(|| Ok(schema()));
        catalog
            .expect_load_reference_data()
            .returning(|| Err(DomainError::catalog("boom")));
        catalog
            .expect_load_business_dictionary()
            .returning(|| Err(DomainError::catalog("boom")));

        let context = assembler(catalog).assemble(&[example("X")]).await.unwrap();

        assert!(context.schema.render().contains("CREATE TABLE nasabah"));
        assert_eq!(context.reference_data, "");
        assert_eq!(context.dictionary, "");
        assert!(context.examples.contains("X\n---\n"));
    }

    #[tokio::test]
    async fn test_assemble_renders_reference_and_dictionary() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_load_schema().returning(|| Ok(schema()));
        catalog.expect_load_reference_data().returning(|| {
            Ok(ReferenceData::new(vec![ReferenceSection {
                table: "master_status_rekening".to_string(),
                entries: vec![("A".to_string(), "Aktif".to_string())],
            }]))
        });
        catalog.expect_load_business_dictionary().returning(|| {
            Ok(BusinessDictionary::new(vec![BusinessTerm {
                term: "penabung".to_string(),
                definition: "Nasabah dengan tabungan".to_string(),
                sql_logic: None,
            }]))
        });

        let context = assembler(catalog).assemble(&[]).await.unwrap();

        assert!(context.reference_data.contains("- ID 'A' = Aktif"));
        assert!(context.dictionary.contains("\"penabung\""));
        assert_eq!(context.examples, "");
    }

    #[tokio::test]
    async fn test_schema_failure_is_fatal() {
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_load_schema()
            .returning(|| Err(DomainError::catalog("No tables found in schema 'bank'")));

        let result = assembler(catalog).assemble(&[]).await;
        assert!(matches!(result, Err(DomainError::Catalog { .. })));
    }

    #[tokio::test]
    async fn test_schema_cached_until_invalidated() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_load_schema().times(2).returning(|| Ok(schema()));

        let assembler = assembler(catalog);
        assembler.schema().await.unwrap();
        assembler.schema().await.unwrap();
        assembler.invalidate_schema();
        assembler.schema().await.unwrap();
    }

    #[tokio::test]
    async fn test_retrieve_examples_filters_category() {
        let store = Arc::new(InMemoryVectorStore::new());
        store.ensure_collection("ledger_rag", 2, Distance::Cosine).await.unwrap();
        store
            .upsert(
                "ledger_rag",
                vec![
                    VectorPoint::new("1", vec![1.0, 0.0], ddl_payload("CREATE TABLE nasabah ();")),
                    VectorPoint::new(
                        "2",
                        vec![0.9, 0.1],
                        SqlExample::from_correction("jumlah nasabah", "SELECT COUNT(*) FROM nasabah").payload(),
                    ),
                ],
            )
            .await
            .unwrap();

        let assembler = ContextAssembler::new(
            Arc::new(MockCatalogRepository::new()),
            store,
            "ledger_rag",
            RagConfig::default(),
        );

        let examples = assembler.retrieve_examples(&[1.0, 0.0]).await.unwrap();

        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].category, Some(ExampleCategory::Sql));
        assert_eq!(examples[0].preview.as_deref(), Some("jumlah nasabah"));
    }
}
