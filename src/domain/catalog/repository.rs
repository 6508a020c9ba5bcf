//! Catalog repository trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{BusinessDictionary, ReferenceData, SchemaContext, SqlExample};
use crate::domain::DomainError;

/// Read access to the ledger catalog and its curated tables
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All tables and columns of the configured schema, ordered by table then position
    async fn load_schema(&self) -> Result<SchemaContext, DomainError>;

    /// Rows of every configured lookup table
    async fn load_reference_data(&self) -> Result<ReferenceData, DomainError>;

    async fn load_business_dictionary(&self) -> Result<BusinessDictionary, DomainError>;

    /// Curated question/SQL pairs in insertion order
    async fn list_sql_examples(&self) -> Result<Vec<SqlExample>, DomainError>;

    async fn add_sql_example(&self, example: SqlExample) -> Result<(), DomainError>;

    /// Whether an active nonsense keyword occurs in the prompt
    async fn matches_absurd_keyword(&self, prompt: &str) -> Result<bool, DomainError>;
}
