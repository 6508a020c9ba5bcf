//! Retrain command - rebuilds the retrieval index once

use tracing::info;

/// Rebuild the index synchronously and exit
pub async fn run() -> anyhow::Result<()> {
    let config = super::load_config()?;

    let services = crate::create_app_services(&config).await?;
    let report = services.training_service.retrain().await?;

    info!(
        ddl_fragments = report.ddl_fragments,
        sql_examples = report.sql_examples,
        "Retrain complete"
    );

    services.shutdown().await;
    Ok(())
}
