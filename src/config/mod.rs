//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, BackendConfig, BackendKind, EmbeddingConfig, LogFormat, LoggingConfig, StoreConfig,
    DATABASE_URL_ENV, INDEX_NAME_ENV, OPENAI_API_KEY_ENV,
};
