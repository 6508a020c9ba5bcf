//! Domain layer - Core business logic and entities

pub mod catalog;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod query;
pub mod semantic_cache;
pub mod sql;
pub mod vector_store;

pub use error::DomainError;
pub use llm::{
    ChainLink, FinishReason, LlmProvider, LlmRequest, LlmResponse, Message,
    MessageRole, ProviderChain, Usage,
};
