//! LLM provider domain models and traits

mod chain;
mod message;
mod provider;
mod request;
mod response;

pub use chain::{ChainLink, LinkFailure, ProviderChain};
pub use message::{Message, MessageRole};
pub use provider::LlmProvider;
pub use request::LlmRequest;
pub use response::{FinishReason, LlmResponse, Usage};

#[cfg(test)]
pub use provider::mock::MockLlmProvider;
