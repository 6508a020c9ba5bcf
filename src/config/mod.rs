//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, DatabaseConfig, EmbeddingConfig, LlmConfig, LlmEndpointConfig, LogFormat,
    LoggingConfig, QueryConfig, ServerConfig, VectorStoreConfig,
};
