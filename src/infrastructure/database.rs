//! PostgreSQL connection pool shared by the catalog and the executor

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::domain::DomainError;

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Open the pool with the configured bounds
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::configuration(format!("Failed to connect to PostgreSQL: {}", e)))?;

    info!(
        max_connections = config.max_connections,
        "PostgreSQL connection pool ready"
    );

    Ok(pool)
}

/// Schema, table and column names are interpolated into SQL text, so only
/// plain identifiers are accepted
pub fn checked_identifier(name: &str) -> Result<&str, DomainError> {
    if IDENTIFIER_PATTERN.is_match(name) {
        Ok(name)
    } else {
        Err(DomainError::configuration(format!(
            "Invalid SQL identifier '{}'",
            name
        )))
    }
}
