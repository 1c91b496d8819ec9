use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VireoError};

/// Top-level Vireo configuration, loaded from `vireo.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub embedding: Option<EmbeddingConfig>,
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VireoError::ConfigNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| VireoError::Config(e.to_string()))
    }
}

/// Engine-level defaults and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default number of chunks kept after the retrieval merge.
    #[serde(default = "default_result_count")]
    pub default_result_count: usize,
    /// Default sampling temperature when a component doesn't set one.
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    /// Ordered model preference list tried before the component's own model.
    #[serde(default = "default_fallback_models")]
    pub fallback_models: Vec<String>,
    /// Per-turn wall-clock deadline. Expiry aborts dispatch at the next
    /// suspension point and records a timeout error message.
    #[serde(default = "default_turn_timeout")]
    pub turn_timeout_secs: u64,
    /// Max concurrent per-document retrieval calls in the knowledge base.
    #[serde(default = "default_retrieval_fanout")]
    pub retrieval_fanout: usize,
    /// Reject graphs with cycles, duplicate ids, or no query→output path.
    /// Off by default so partially built graphs stay editable.
    #[serde(default)]
    pub strict_validation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_result_count: default_result_count(),
            default_temperature: default_temperature(),
            fallback_models: default_fallback_models(),
            turn_timeout_secs: default_turn_timeout(),
            retrieval_fanout: default_retrieval_fanout(),
            strict_validation: false,
        }
    }
}

fn default_result_count() -> usize {
    3
}

fn default_temperature() -> f32 {
    0.7
}

fn default_fallback_models() -> Vec<String> {
    vec![
        "gemini-2.5-flash".into(),
        "gemini-2.5-pro".into(),
        "gemini-2.0-flash".into(),
    ]
}

fn default_turn_timeout() -> u64 {
    120
}

fn default_retrieval_fanout() -> usize {
    4
}

/// Language-model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider name: "gemini", or any OpenAI-compatible endpoint.
    pub provider: String,
    /// Default model id when a component doesn't configure one.
    pub model_id: String,
    /// Raw key or `${ENV_VAR}` reference.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl ModelConfig {
    /// Resolve `${ENV_VAR}` references in the api key.
    pub fn resolved_api_key(&self) -> Option<String> {
        let raw = self.api_key.as_deref()?;
        if let Some(var) = raw.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
            std::env::var(var).ok()
        } else {
            Some(raw.to_string())
        }
    }
}

/// Embedding provider settings for the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_dimensions() -> usize {
    768
}

/// Persistence locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            index_path: default_index_path(),
        }
    }
}

fn default_db_path() -> String {
    "vireo.db".into()
}

fn default_index_path() -> String {
    "vireo-index.db".into()
}
