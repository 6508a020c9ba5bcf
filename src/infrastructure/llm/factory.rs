use std::sync::Arc;
use std::time::Duration;

use super::http_client::HttpClient;
use super::OpenAiProvider;
use crate::config::{LlmConfig, LlmEndpointConfig};
use crate::domain::{ChainLink, DomainError, LlmProvider, ProviderChain};

/// Factory for creating LLM providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create a provider for one OpenAI-compatible endpoint
    pub fn create(endpoint: &LlmEndpointConfig) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let http_client = HttpClient::with_timeout(Duration::from_secs(endpoint.timeout_secs))?;

        Ok(Arc::new(OpenAiProvider::new(
            http_client,
            endpoint.name.clone(),
            endpoint.base_url.clone(),
            endpoint.api_key.clone(),
        )))
    }

    /// Local model first (when configured), then the cloud model
    pub fn create_chain(config: &LlmConfig) -> Result<ProviderChain, DomainError> {
        let mut chain = ProviderChain::new();

        if let Some(ref local) = config.local {
            chain = chain.with_link(ChainLink::new(Self::create(local)?, local.model.clone()));
        }

        let cloud = &config.cloud;
        Ok(chain.with_link(ChainLink::new(Self::create(cloud)?, cloud.model.clone())))
    }
}
