//! Language-model providers and the candidate-fallback generation layer.

pub mod fallback;
pub mod providers;

use std::sync::Arc;

use vireo_core::config::ModelConfig;
use vireo_core::traits::LanguageModel;

pub use fallback::FallbackGenerator;
pub use providers::{Completion, GeminiProvider, OpenAiProvider};

/// Build the language model described by the configuration.
///
/// "gemini" gets the native client; any other provider name is treated as
/// an OpenAI-compatible endpoint.
pub fn build_model(config: &ModelConfig) -> Arc<dyn LanguageModel> {
    let api_key = config.resolved_api_key();
    let provider: Box<dyn Completion> = match config.provider.as_str() {
        "gemini" => Box::new(GeminiProvider::new(
            api_key.as_deref().unwrap_or_default(),
            config.base_url.as_deref(),
        )),
        other => Box::new(OpenAiProvider::new(
            other,
            api_key.as_deref(),
            config.base_url.as_deref(),
        )),
    };
    Arc::new(FallbackGenerator::new(provider))
}
