//! Infrastructure layer - External service implementations

pub mod catalog;
pub mod database;
pub mod embedding;
pub mod executor;
pub mod llm;
pub mod logging;
pub mod semantic_cache;
pub mod services;
pub mod vector_store;
