//! Semantic cache implementations

mod in_memory;
mod vector_store;

pub use in_memory::InMemorySemanticCache;
pub use vector_store::VectorStoreSemanticCache;
