//! Ambient configuration shared by every topic-discovery service.
//!
//! Environment loading, the persistent article store, and metrics middleware
//! are external collaborators; this crate only owns the bits every service
//! needs to boot: which LLM backend to call, where to reach it, and the log
//! level. Initialization is eager and fails fast on missing credentials so a
//! misconfigured service never serves a single request.

use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("neither GOOGLE_API_KEY nor CHAIR_API_KEY is set; one LLM credential is required")]
    MissingLlmCredentials,
}

/// Which LLM credential selected the backend. The provider client itself
/// lives in `conhub-core`; this only records which key won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Google,
    Chair,
}

impl LlmBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmBackend::Google => "google",
            LlmBackend::Chair => "chair",
        }
    }
}

/// Inert connection parameters for the relational article store. The store
/// itself is out of scope here; these fields only exist because the
/// environment contract names them.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub db: String,
    pub user: String,
    pub password: String,
}

impl PostgresConfig {
    fn from_env() -> Self {
        Self {
            host: std::env::var("POSTGRES_HOST").unwrap_or_else(|_| "db".to_string()),
            port: std::env::var("POSTGRES_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5432),
            db: std::env::var("POSTGRES_DB").unwrap_or_else(|_| "postgres".to_string()),
            user: std::env::var("POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("POSTGRES_PASSWORD").unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub http_client: Client,
    pub llm_backend: LlmBackend,
    pub llm_api_key: String,
    pub genai_base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub qdrant_url: String,
    pub log_level: String,
    pub postgres: std::sync::Arc<PostgresConfig>,
}

impl AppConfig {
    /// Loads configuration from the environment. Fails fast: a missing LLM
    /// credential is a startup error, never a per-request one.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();

        let (llm_backend, llm_api_key) = if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            (LlmBackend::Google, key)
        } else if let Ok(key) = std::env::var("CHAIR_API_KEY") {
            (LlmBackend::Chair, key)
        } else {
            return Err(ConfigError::MissingLlmCredentials);
        };

        Ok(Self {
            http_client: Client::new(),
            llm_backend,
            llm_api_key,
            genai_base_url: std::env::var("GENAI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            chat_model: std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            qdrant_url: std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            postgres: std::sync::Arc::new(PostgresConfig::from_env()),
        })
    }
}
