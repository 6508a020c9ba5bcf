//! Prompt construction and SQL extraction around the provider chain

use chrono::{Local, NaiveDate};
use tracing::{debug, info, warn};

use super::AssembledContext;
use crate::domain::query::QueryError;
use crate::domain::sql::{extract_sql, sanitize_generated_sql};
use crate::domain::{LlmRequest, ProviderChain};

const INSTRUCTIONS: &str = "\
Rules:
a. Use only tables and columns that appear in the DDL above. Never invent a table or column; if a retrieved example uses a column that is not in the DDL, ignore that example.
b. Only read data. Write a single SELECT statement; never modify data or schema.
c. Put literal values directly into the statement. Do not use bound parameters or placeholders such as $1 or ?.
d. When the question names a specific type, status or category, join the matching lookup table and filter on its name column instead of guessing an ID.
If the question uses a term from the business dictionary, apply its mandatory SQL logic.

Answer format:
Explanation: <one or two sentences>

```sql
<final SQL>
```";

/// Render the generation prompt. The output depends only on its inputs.
pub fn build_prompt(question: &str, context: &AssembledContext, today: NaiveDate) -> String {
    let mut prompt = format!(
        "You are a PostgreSQL expert. Today's date (CURRENT_DATE) is {}.\n\n",
        today.format("%Y-%m-%d")
    );

    prompt.push_str("== DATABASE SCHEMA (COMPLETE DDL) ==\n");
    prompt.push_str(&context.schema.render());
    prompt.push_str("\n\n");

    if !context.reference_data.trim().is_empty() {
        prompt.push_str("== REFERENCE DATA (use these IDs and labels exactly) ==\n");
        prompt.push_str(&context.reference_data);
        prompt.push_str("\n\n");
    }

    if !context.dictionary.trim().is_empty() {
        prompt.push_str("== BUSINESS DICTIONARY (high priority) ==\n");
        prompt.push_str(&context.dictionary);
        prompt.push_str("\n\n");
    }

    if !context.examples.trim().is_empty() {
        prompt.push_str("== EXAMPLES ==\n");
        prompt.push_str(&context.examples);
        prompt.push('\n');
    }

    prompt.push_str(INSTRUCTIONS);
    prompt.push_str(&format!("\n\nUser question: \"{}\"\n", question));

    prompt
}

/// Turns a question and its context into sanitized SQL
#[derive(Debug, Clone)]
pub struct SqlGenerator {
    chain: ProviderChain,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl SqlGenerator {
    pub fn new(chain: ProviderChain) -> Self {
        Self {
            chain,
            temperature: 0.0,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub async fn generate(
        &self,
        question: &str,
        context: &AssembledContext,
    ) -> Result<String, QueryError> {
        let prompt = build_prompt(question, context, Local::now().date_naive());
        debug!(prompt_len = prompt.len(), "Generation prompt assembled");

        let request = LlmRequest::prompt(prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self
            .chain
            .chat(request)
            .await
            .map_err(|e| QueryError::Generation(e.to_string()))?;

        let extracted = extract_sql(response.content());

        match sanitize_generated_sql(&extracted) {
            Some(sql) => {
                info!(model = %response.model, "SQL generated");
                Ok(sql)
            }
            None => {
                warn!(completion = %response.content(), "Model output contained no usable SQL");
                Err(QueryError::EmptySql)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{ColumnDefinition, SchemaContext, TableDdl};
    use crate::domain::llm::MockLlmProvider;
    use crate::domain::ChainLink;
    use std::sync::Arc;

    fn context() -> AssembledContext {
        AssembledContext {
            schema: Arc::new(SchemaContext::new(
                "bank",
                vec![TableDdl::new("nasabah").with_column(ColumnDefinition::new("nama_lengkap", "text"))],
            )),
            reference_data: "Table master_tipe_nasabah:\n- ID '1' = Perorangan\n".to_string(),
            dictionary: String::new(),
            examples: String::new(),
        }
    }

    fn generator(provider: MockLlmProvider) -> SqlGenerator {
        SqlGenerator::new(ProviderChain::new().with_link(ChainLink::new(Arc::new(provider), "m")))
    }

    #[test]
    fn test_prompt_is_deterministic_and_complete() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let a = build_prompt("jumlah nasabah", &context(), today);
        let b = build_prompt("jumlah nasabah", &context(), today);

        assert_eq!(a, b);
        assert!(a.contains("2025-01-31"));
        assert!(a.contains("CREATE TABLE nasabah"));
        assert!(a.contains("- ID '1' = Perorangan"));
        assert!(a.contains("User question: \"jumlah nasabah\""));
        assert!(a.contains("Never invent a table or column"));
        assert!(a.contains("single SELECT"));
        assert!(a.contains("placeholders"));
        assert!(a.contains("join the matching lookup table"));
        assert!(!a.contains("BUSINESS DICTIONARY"));
    }

    #[tokio::test]
    async fn test_generate_extracts_fenced_sql() {
        let provider = MockLlmProvider::new("groq").with_response(
            "Explanation: count rows.\n```sql\n-- count\nSELECT COUNT(*) FROM nasabah;\n```",
        );

        let sql = generator(provider).generate("jumlah nasabah", &context()).await.unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM nasabah;");
    }

    #[tokio::test]
    async fn test_generate_rejects_write_sql() {
        let provider = MockLlmProvider::new("groq").with_response("```sql\nDELETE FROM nasabah\n```");

        let result = generator(provider).generate("q", &context()).await;
        assert!(matches!(result, Err(QueryError::EmptySql)));
    }

    #[tokio::test]
    async fn test_generate_propagates_provider_failure() {
        let provider = MockLlmProvider::new("groq").with_error("HTTP 500");

        let result = generator(provider).generate("q", &context()).await;
        assert!(matches!(result, Err(QueryError::Generation(_))));
    }

    #[tokio::test]
    async fn test_generate_sends_temperature() {
        let provider = Arc::new(MockLlmProvider::new("groq").with_response("SELECT 1"));
        let generator = SqlGenerator::new(
            ProviderChain::new().with_link(ChainLink::new(provider.clone(), "m")),
        )
        .with_max_tokens(Some(512));

        generator.generate("q", &context()).await.unwrap();

        let request = provider.last_request().unwrap();
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(512));
        assert!(request.prompt_text().contains("User question: \"q\""));
    }
}
