use futures::future::BoxFuture;
use tracing::info;

use vireo_core::error::Result;
use vireo_core::workflow::KIND_LLM_ENGINE;

use super::{config_f32, config_str, ComponentConfig, ComponentHandler, TurnScope};
use crate::context::ExecutionContext;

/// System prompt used when the component doesn't configure its own.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Language-model invocation.
///
/// Builds the prompt from the turn query plus any retrieved context, then
/// asks the model collaborator to try the candidate list in order: the
/// engine's fixed preference list first, with the component's configured
/// model appended last as an extra candidate.
pub struct LlmEngineHandler;

impl ComponentHandler for LlmEngineHandler {
    fn kind(&self) -> &'static str {
        KIND_LLM_ENGINE
    }

    fn run<'a>(
        &'a self,
        scope: &'a TurnScope<'a>,
        config: &'a ComponentConfig,
        ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let system_prompt = config_str(config, "custom_prompt").unwrap_or(DEFAULT_SYSTEM_PROMPT);
            let temperature =
                config_f32(config, "temperature").unwrap_or(scope.defaults.default_temperature);

            let mut candidates = scope.defaults.fallback_models.clone();
            if let Some(model_name) = config_str(config, "model_name") {
                candidates.push(model_name.to_string());
            }

            let user_message = if ctx.has_retrieval() {
                format!(
                    "Context: {}\n\nQuestion: {}",
                    ctx.retrieved_text.as_deref().unwrap_or_default(),
                    ctx.query
                )
            } else {
                ctx.query.clone()
            };

            let reply = scope
                .model
                .generate(system_prompt, &user_message, &candidates, temperature)
                .await?;

            info!(
                model = %reply.model_used,
                provider = %reply.provider,
                "LLM engine produced a reply"
            );
            ctx.model_reply = Some(reply);

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::scope_fixture;
    use vireo_core::VireoError;

    #[tokio::test]
    async fn test_plain_query_without_retrieval() {
        let fixture = scope_fixture();
        let scope = fixture.scope();
        let mut ctx = ExecutionContext::new("What is X");

        LlmEngineHandler
            .run(&scope, &ComponentConfig::new(), &mut ctx)
            .await
            .unwrap();

        let calls = fixture.model.calls.lock().unwrap();
        assert_eq!(calls[0].system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(calls[0].user_message, "What is X");
        assert_eq!(calls[0].temperature, 0.7);
        assert!(ctx.model_reply.is_some());
    }

    #[tokio::test]
    async fn test_retrieved_context_framing() {
        let fixture = scope_fixture();
        let scope = fixture.scope();
        let mut ctx = ExecutionContext::new("What is X");
        ctx.retrieved_text = Some("X is defined in chapter 2.".into());

        LlmEngineHandler
            .run(&scope, &ComponentConfig::new(), &mut ctx)
            .await
            .unwrap();

        let calls = fixture.model.calls.lock().unwrap();
        assert_eq!(
            calls[0].user_message,
            "Context: X is defined in chapter 2.\n\nQuestion: What is X"
        );
    }

    #[tokio::test]
    async fn test_empty_retrieval_falls_back_to_raw_query() {
        let fixture = scope_fixture();
        let scope = fixture.scope();
        let mut ctx = ExecutionContext::new("What is X");
        ctx.retrieved_text = Some(String::new());

        LlmEngineHandler
            .run(&scope, &ComponentConfig::new(), &mut ctx)
            .await
            .unwrap();

        let calls = fixture.model.calls.lock().unwrap();
        assert_eq!(calls[0].user_message, "What is X");
    }

    #[tokio::test]
    async fn test_configured_model_appended_last() {
        let fixture = scope_fixture();
        let scope = fixture.scope();
        let config: ComponentConfig = serde_json::from_str(
            r#"{"model_name": "my-tuned-model", "custom_prompt": "Answer tersely.", "temperature": 0.1}"#,
        )
        .unwrap();
        let mut ctx = ExecutionContext::new("q");

        LlmEngineHandler.run(&scope, &config, &mut ctx).await.unwrap();

        let calls = fixture.model.calls.lock().unwrap();
        assert_eq!(calls[0].system_prompt, "Answer tersely.");
        assert_eq!(calls[0].temperature, 0.1);
        assert_eq!(
            calls[0].candidates.last().map(String::as_str),
            Some("my-tuned-model")
        );
        assert_eq!(
            calls[0].candidates[..calls[0].candidates.len() - 1],
            fixture.defaults.fallback_models[..]
        );
    }

    #[tokio::test]
    async fn test_exhausted_candidates_raise_upstream() {
        let mut fixture = scope_fixture();
        fixture.model.fail_all = true;
        let scope = fixture.scope();
        let mut ctx = ExecutionContext::new("q");

        let err = LlmEngineHandler
            .run(&scope, &ComponentConfig::new(), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, VireoError::Upstream(_)));
        assert!(ctx.model_reply.is_none());
    }
}
