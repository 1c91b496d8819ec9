use futures::future::BoxFuture;
use tracing::warn;

use vireo_core::error::Result;
use vireo_core::workflow::KIND_OUTPUT;

use super::{config_bool, ComponentConfig, ComponentHandler, TurnScope};
use crate::context::{Answer, ExecutionContext};

/// Response returned when no upstream component produced a model reply.
pub const FALLBACK_RESPONSE: &str = "Workflow executed but no response generated";

/// Output formatting. Packages the model reply and provenance into the final
/// answer. A missing model reply is not a failure: the component degrades to
/// a fixed fallback response so a half-wired graph still answers.
pub struct OutputHandler;

impl ComponentHandler for OutputHandler {
    fn kind(&self) -> &'static str {
        KIND_OUTPUT
    }

    fn run<'a>(
        &'a self,
        _scope: &'a TurnScope<'a>,
        config: &'a ComponentConfig,
        ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let show_sources = config_bool(config, "show_sources").unwrap_or(true);

            let answer = match &ctx.model_reply {
                None => {
                    warn!("Output component found no model reply, using fallback response");
                    Answer {
                        response: FALLBACK_RESPONSE.to_string(),
                        metadata: serde_json::json!({}),
                    }
                }
                Some(reply) => {
                    let mut metadata = serde_json::json!({
                        "model_info": {
                            "provider": reply.provider,
                            "model": reply.model_used,
                        }
                    });
                    if show_sources {
                        metadata["sources"] = serde_json::json!(distinct(&ctx.sources));
                    }
                    Answer {
                        response: reply.text.clone(),
                        metadata,
                    }
                }
            };

            ctx.answer = Some(answer);
            Ok(())
        })
    }
}

/// First-seen-order deduplication.
fn distinct(values: &[String]) -> Vec<&str> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value.as_str()) {
            seen.push(value.as_str());
        }
    }
    seen
}
