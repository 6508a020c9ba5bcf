//! Catalog backed by the ledger database itself

use std::fmt::Debug;

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use tracing::{debug, info, warn};

use crate::domain::catalog::{
    BusinessDictionary, BusinessTerm, CatalogRepository, ColumnDefinition, ReferenceData,
    ReferenceSection, ReferenceTable, SchemaContext, SqlExample, TableDdl,
};
use crate::domain::DomainError;
use crate::infrastructure::database::checked_identifier;

const SCHEMA_QUERY: &str = r#"
    SELECT
        c.table_name::text AS table_name,
        c.column_name::text AS column_name,
        c.data_type::text AS data_type,
        col_description(
            format('%I.%I', c.table_schema, c.table_name)::regclass,
            c.ordinal_position::int
        ) AS column_comment,
        obj_description(
            format('%I.%I', c.table_schema, c.table_name)::regclass,
            'pg_class'
        ) AS table_comment
    FROM information_schema.columns c
    WHERE c.table_schema = $1
    ORDER BY c.table_name, c.ordinal_position
"#;

/// One row of the column catalog
#[derive(Debug, Clone, PartialEq)]
struct CatalogColumn {
    table_name: String,
    column_name: String,
    data_type: String,
    column_comment: Option<String>,
    table_comment: Option<String>,
}

/// Group ordered catalog rows into one DDL fragment per table
fn build_tables(rows: Vec<CatalogColumn>) -> Vec<TableDdl> {
    let mut tables: Vec<TableDdl> = Vec::new();

    for row in rows {
        let starts_new = tables.last().is_none_or(|t| t.table != row.table_name);
        if starts_new {
            let mut table = TableDdl::new(&row.table_name);
            if let Some(comment) = row.table_comment.as_deref() {
                table = table.with_comment(comment);
            }
            tables.push(table);
        }

        let mut column = ColumnDefinition::new(row.column_name, row.data_type);
        if let Some(comment) = row.column_comment {
            column = column.with_comment(comment);
        }

        if let Some(table) = tables.last_mut() {
            table.columns.push(column);
        }
    }

    tables
}

/// Reads schema, lookup tables, vocabulary and examples from PostgreSQL
#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
    schema: String,
    reference_tables: Vec<ReferenceTable>,
}

impl Debug for PostgresCatalogRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCatalogRepository")
            .field("schema", &self.schema)
            .field("reference_tables", &self.reference_tables.len())
            .finish()
    }
}

impl PostgresCatalogRepository {
    pub fn new(
        pool: PgPool,
        schema: impl Into<String>,
        reference_tables: Vec<ReferenceTable>,
    ) -> Result<Self, DomainError> {
        let schema = schema.into();
        checked_identifier(&schema)?;

        for table in &reference_tables {
            checked_identifier(&table.table)?;
            checked_identifier(&table.id_column)?;
            checked_identifier(&table.label_column)?;
        }

        Ok(Self {
            pool,
            schema,
            reference_tables,
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    async fn load_reference_section(
        &self,
        table: &ReferenceTable,
    ) -> Result<ReferenceSection, sqlx::Error> {
        let query = format!(
            "SELECT {id}::text AS id, {label}::text AS label FROM {schema}.{table} ORDER BY {id} ASC",
            id = table.id_column,
            label = table.label_column,
            schema = self.schema,
            table = table.table,
        );

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let entries = rows
            .iter()
            .filter_map(|row| {
                let id: Option<String> = row.try_get("id").ok()?;
                let label: Option<String> = row.try_get("label").ok()?;
                Some((id.unwrap_or_default(), label.unwrap_or_default()))
            })
            .collect();

        Ok(ReferenceSection {
            table: table.table.clone(),
            entries,
        })
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn load_schema(&self) -> Result<SchemaContext, DomainError> {
        let rows = sqlx::query(SCHEMA_QUERY)
            .bind(&self.schema)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::catalog(format!("Failed to query information_schema: {}", e)))?;

        let columns = rows
            .iter()
            .map(|row| -> Result<CatalogColumn, sqlx::Error> {
                Ok(CatalogColumn {
                    table_name: row.try_get("table_name")?,
                    column_name: row.try_get("column_name")?,
                    data_type: row.try_get("data_type")?,
                    column_comment: row.try_get("column_comment")?,
                    table_comment: row.try_get("table_comment")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| DomainError::catalog(format!("Failed to read catalog row: {}", e)))?;

        let tables = build_tables(columns);
        if tables.is_empty() {
            return Err(DomainError::catalog(format!(
                "No tables found in schema '{}'",
                self.schema
            )));
        }

        info!(schema = %self.schema, tables = tables.len(), "Loaded schema DDL");
        Ok(SchemaContext::new(&self.schema, tables))
    }

    async fn load_reference_data(&self) -> Result<ReferenceData, DomainError> {
        let mut sections = Vec::with_capacity(self.reference_tables.len());

        for table in &self.reference_tables {
            match self.load_reference_section(table).await {
                Ok(section) => sections.push(section),
                Err(e) => {
                    warn!(table = %table.table, error = %e, "Skipping reference table");
                }
            }
        }

        Ok(ReferenceData::new(sections))
    }

    async fn load_business_dictionary(&self) -> Result<BusinessDictionary, DomainError> {
        let query = format!(
            "SELECT istilah, definisi_bisnis, logika_sql FROM {}.ai_dictionary",
            self.schema
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::catalog(format!("Failed to query ai_dictionary: {}", e)))?;

        let terms = rows
            .iter()
            .map(|row| -> Result<BusinessTerm, sqlx::Error> {
                Ok(BusinessTerm {
                    term: row.try_get("istilah")?,
                    definition: row.try_get("definisi_bisnis")?,
                    sql_logic: row.try_get("logika_sql")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| DomainError::catalog(format!("Failed to read ai_dictionary row: {}", e)))?;

        Ok(BusinessDictionary::new(terms))
    }

    async fn list_sql_examples(&self) -> Result<Vec<SqlExample>, DomainError> {
        let query = format!(
            "SELECT prompt_example, sql_example FROM {}.rag_sql_examples ORDER BY id",
            self.schema
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::catalog(format!("Failed to query rag_sql_examples: {}", e)))?;

        let examples = rows
            .iter()
            .map(|row| -> Result<SqlExample, sqlx::Error> {
                Ok(SqlExample::new(
                    row.try_get::<String, _>("prompt_example")?,
                    row.try_get::<String, _>("sql_example")?,
                ))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| DomainError::catalog(format!("Failed to read rag_sql_examples row: {}", e)))?;

        if examples.is_empty() {
            warn!(schema = %self.schema, "No SQL examples found in rag_sql_examples");
        } else {
            debug!(count = examples.len(), "Loaded SQL examples");
        }

        Ok(examples)
    }

    async fn add_sql_example(&self, example: SqlExample) -> Result<(), DomainError> {
        let query = format!(
            "INSERT INTO {}.rag_sql_examples (prompt_example, sql_example) VALUES ($1, $2)",
            self.schema
        );

        sqlx::query(&query)
            .bind(&example.question)
            .bind(&example.sql)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::catalog(format!("Failed to insert SQL example: {}", e)))?;

        info!(question = %example.question, "Stored corrected SQL example");
        Ok(())
    }

    async fn matches_absurd_keyword(&self, prompt: &str) -> Result<bool, DomainError> {
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM {}.absurd_keywords \
             WHERE is_active = true AND $1 ILIKE '%' || keyword || '%')",
            self.schema
        );

        let exists: bool = sqlx::query_scalar(&query)
            .bind(prompt.to_lowercase())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::catalog(format!("Failed to query absurd_keywords: {}", e)))?;

        if exists {
            info!(prompt = %prompt, "Prompt matched an absurd keyword");
        }

        Ok(exists)
    }
}
