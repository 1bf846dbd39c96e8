use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Which backing the chat session store uses.
#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Memory,
    Surreal,
}

/// Which backend generates embedding vectors.
#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    OpenAI,
    Hashed,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,
    pub http_port: u16,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
    #[serde(default = "default_embedding_backend")]
    pub embedding_backend: EmbeddingBackend,
    #[serde(default = "default_chunk_capacity")]
    pub chunk_capacity: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
    #[serde(default = "default_entity_catalog_path")]
    pub entity_catalog_path: String,
    #[serde(default = "default_session_backend")]
    pub session_backend: SessionBackend,
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> u32 {
    1536
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::OpenAI
}

fn default_chunk_capacity() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_retrieval_top_k() -> usize {
    5
}

fn default_entity_catalog_path() -> String {
    "./data/entities.json".to_string()
}

fn default_session_backend() -> SessionBackend {
    SessionBackend::Memory
}

fn default_session_ttl_seconds() -> u64 {
    3600
}

fn default_request_timeout_seconds() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            surrealdb_address: "mem://".to_string(),
            surrealdb_username: "root".to_string(),
            surrealdb_password: "root".to_string(),
            surrealdb_namespace: "ragchat".to_string(),
            surrealdb_database: "ragchat".to_string(),
            http_port: 8000,
            openai_base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            embedding_backend: default_embedding_backend(),
            chunk_capacity: default_chunk_capacity(),
            chunk_overlap: default_chunk_overlap(),
            retrieval_top_k: default_retrieval_top_k(),
            entity_catalog_path: default_entity_catalog_path(),
            session_backend: default_session_backend(),
            session_ttl_seconds: default_session_ttl_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
