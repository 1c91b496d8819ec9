use futures::future::BoxFuture;
use tracing::{debug, warn};

use vireo_core::error::{Result, VireoError};
use vireo_core::traits::LanguageModel;
use vireo_core::types::ModelReply;

use crate::providers::Completion;

/// Tries candidate models in order against one provider and returns the
/// first non-empty reply.
pub struct FallbackGenerator {
    provider: Box<dyn Completion>,
}

impl FallbackGenerator {
    pub fn new(provider: Box<dyn Completion>) -> Self {
        Self { provider }
    }
}

impl LanguageModel for FallbackGenerator {
    fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        candidates: &[String],
        temperature: f32,
    ) -> BoxFuture<'_, Result<ModelReply>> {
        let system_prompt = system_prompt.to_string();
        let user_message = user_message.to_string();
        let candidates = candidates.to_vec();
        Box::pin(async move {
            if candidates.is_empty() {
                return Err(VireoError::Upstream("No candidate models configured".into()));
            }

            let mut last_failure = String::new();
            for candidate in &candidates {
                match self
                    .provider
                    .complete(candidate, &system_prompt, &user_message, temperature)
                    .await
                {
                    Ok(text) if !text.trim().is_empty() => {
                        debug!(model = %candidate, "candidate succeeded");
                        return Ok(ModelReply {
                            text,
                            model_used: candidate.clone(),
                            provider: self.provider.name().to_string(),
                        });
                    }
                    Ok(_) => {
                        warn!(model = %candidate, "candidate returned empty reply, trying next");
                        last_failure = format!("{candidate}: empty reply");
                    }
                    Err(e) => {
                        warn!(model = %candidate, error = %e, "candidate failed, trying next");
                        last_failure = format!("{candidate}: {e}");
                    }
                }
            }

            Err(VireoError::Upstream(format!(
                "All candidate models failed, last: {last_failure}"
            )))
        })
    }
}
