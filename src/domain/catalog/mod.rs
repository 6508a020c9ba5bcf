//! Ledger catalog: schema, lookup tables, business vocabulary and worked examples

mod dictionary;
mod reference;
mod repository;
mod retrieval;
mod schema;

pub use dictionary::{BusinessDictionary, BusinessTerm};
pub use reference::{ReferenceData, ReferenceSection, ReferenceTable};
pub use repository::CatalogRepository;
pub use retrieval::{
    clean_question, ddl_payload, ExampleCategory, LowConfidencePolicy, RagConfig,
    RetrievedExample, SqlExample, CATEGORY_KEY, CONTENT_KEY, MAX_SUGGESTIONS, PREVIEW_KEY,
};
pub use schema::{ColumnDefinition, SchemaContext, TableDdl};

#[cfg(test)]
pub use repository::MockCatalogRepository;
