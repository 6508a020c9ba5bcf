//! Semantic cache domain: entries, hit policy and the cache contract

mod config;
mod entry;
mod repository;

pub use config::{CacheBackend, SemanticCacheConfig};
pub use entry::{CacheEntry, CacheMatch, GENERATION_KEY, PROMPT_KEY, SQL_KEY};
pub use repository::SemanticCache;
