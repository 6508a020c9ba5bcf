//! Ordered provider fallback chain
//!
//! Providers are tried one after another until one answers. There is no
//! parallel fan-out and no blending of answers.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use super::{LlmProvider, LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// A provider paired with the model it should be asked for
#[derive(Debug, Clone)]
pub struct ChainLink {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl ChainLink {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Failure of a single link, kept for the aggregated error
#[derive(Debug, Clone)]
pub struct LinkFailure {
    pub provider: String,
    pub error: String,
}

/// Sequential first-success chain over LLM providers
#[derive(Debug, Clone, Default)]
pub struct ProviderChain {
    links: Vec<ChainLink>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_link(mut self, link: ChainLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Runs the request through each link in order and returns the first success
    pub async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, DomainError> {
        if self.links.is_empty() {
            return Err(DomainError::configuration("Provider chain has no links"));
        }

        let mut failures = Vec::new();

        for link in &self.links {
            let start = Instant::now();

            match link.provider.chat(&link.model, request.clone()).await {
                Ok(response) => {
                    debug!(
                        provider = %link.provider_name(),
                        model = %link.model,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Provider answered"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        provider = %link.provider_name(),
                        model = %link.model,
                        error = %e,
                        "Provider failed, trying next link"
                    );
                    failures.push(LinkFailure {
                        provider: link.provider_name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Err(aggregate_failures(&failures))
    }
}

fn aggregate_failures(failures: &[LinkFailure]) -> DomainError {
    let detail = failures
        .iter()
        .map(|f| format!("{}: {}", f.provider, f.error))
        .collect::<Vec<_>>()
        .join("; ");

    DomainError::provider("chain", format!("All providers failed ({})", detail))
}
