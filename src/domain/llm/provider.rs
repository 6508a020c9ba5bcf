use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Trait for chat completion backends
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Name used in logs and aggregated errors
    fn provider_name(&self) -> &str;
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::domain::llm::Message;

    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: String,
        response: Option<String>,
        error: Option<String>,
        calls: Arc<AtomicUsize>,
        last_request: Mutex<Option<LlmRequest>>,
    }

    impl MockLlmProvider {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                response: None,
                error: None,
                calls: Arc::new(AtomicUsize::new(0)),
                last_request: Mutex::new(None),
            }
        }

        pub fn with_response(mut self, content: impl Into<String>) -> Self {
            self.response = Some(content.into());
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Shared counter of `chat` invocations
        pub fn call_counter(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<LlmRequest> {
            self.last_request.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider(&self.name, error));
            }

            self.response
                .clone()
                .map(|content| {
                    LlmResponse::new(
                        "mock-completion".to_string(),
                        model.to_string(),
                        Message::assistant(content),
                    )
                })
                .ok_or_else(|| DomainError::provider(&self.name, "No mock response configured"))
        }

        fn provider_name(&self) -> &str {
            &self.name
        }
    }
}
