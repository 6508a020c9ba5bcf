//! Embedding provider implementations

mod gemini;

pub use gemini::GeminiEmbeddingProvider;

// Re-export HTTP client for use by embedding providers
pub use super::llm::{HttpClient, HttpClientTrait};
