use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use vireo_core::config::EngineConfig;
use vireo_core::error::{Result, VireoError};
use vireo_core::traits::{
    ChatHistoryStore, DocumentStore, LanguageModel, VectorIndex, WorkflowStore,
};
use vireo_core::types::{ChatRole, SessionId, TurnOutcome};
use vireo_core::workflow::{Component, WorkflowDefinition};

use crate::context::{Answer, ExecutionContext};
use crate::handlers::output::FALLBACK_RESPONSE;
use crate::handlers::{HandlerRegistry, TurnScope};
use crate::order::resolve_order;
use crate::validator::{validate, validate_strict};

/// Drives one conversational turn end to end: validate, resolve order, bind
/// a session, persist the user message, dispatch handlers, persist the
/// assistant message.
///
/// Rejections before the user message is persisted leave no durable trace.
/// Once dispatch starts the turn always ends with an assistant message: the
/// answer on success, the error text (with `error: true` metadata) on
/// failure or timeout.
///
/// All collaborators are injected at construction so tests can substitute
/// deterministic fakes.
pub struct WorkflowEngine {
    workflows: Arc<dyn WorkflowStore>,
    documents: Arc<dyn DocumentStore>,
    index: Arc<dyn VectorIndex>,
    model: Arc<dyn LanguageModel>,
    history: Arc<dyn ChatHistoryStore>,
    registry: HandlerRegistry,
    config: EngineConfig,
}

impl WorkflowEngine {
    /// Build an engine with the built-in handler registry.
    pub fn new(
        workflows: Arc<dyn WorkflowStore>,
        documents: Arc<dyn DocumentStore>,
        index: Arc<dyn VectorIndex>,
        model: Arc<dyn LanguageModel>,
        history: Arc<dyn ChatHistoryStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            workflows,
            documents,
            index,
            model,
            history,
            registry: HandlerRegistry::with_builtins(),
            config,
        }
    }

    /// Replace the handler registry, e.g. to add custom component kinds.
    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Execute one turn of a workflow against a query.
    ///
    /// Creates a new session when `session_id` is `None`. Returns the final
    /// answer with provenance metadata and wall-clock timing.
    pub async fn execute(
        &self,
        workflow_id: &str,
        query: &str,
        session_id: Option<SessionId>,
    ) -> Result<TurnOutcome> {
        let start = Instant::now();

        let definition = self
            .workflows
            .get(workflow_id)
            .await?
            .ok_or_else(|| VireoError::WorkflowNotFound(workflow_id.to_string()))?;

        debug!(workflow_id, phase = "validating", "Turn started");
        let report = if self.config.strict_validation {
            validate_strict(&definition.components, &definition.connections)
        } else {
            validate(&definition.components, &definition.connections)
        };
        for warning in &report.warnings {
            warn!(workflow_id, %warning, "Workflow validation warning");
        }
        if !report.is_valid {
            return Err(VireoError::InvalidWorkflow {
                errors: report.errors,
            });
        }

        let order = resolve_order(&definition.components, &definition.connections)?;
        debug!(workflow_id, ?order, phase = "ordered", "Resolved execution order");

        debug!(workflow_id, phase = "session_binding", "Binding chat session");
        let session = match session_id {
            None => self.history.create_session(workflow_id).await?,
            Some(id) => self
                .history
                .get_session(&id)
                .await?
                .ok_or_else(|| VireoError::SessionNotFound(id.to_string()))?,
        };

        // The user message is durable before dispatch, so a failed turn is
        // still visible in history.
        self.history
            .append_message(&session.id, ChatRole::User, query, &serde_json::json!({}))
            .await?;
        debug!(
            session_id = %session.id,
            phase = "user_message_persisted",
            "Dispatching components"
        );

        let deadline = Duration::from_secs(self.config.turn_timeout_secs);
        let result = match tokio::time::timeout(deadline, self.dispatch(&definition, &order, query))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(VireoError::Timeout {
                limit_secs: self.config.turn_timeout_secs,
            }),
        };

        match result {
            Ok(answer) => {
                self.history
                    .append_message(
                        &session.id,
                        ChatRole::Assistant,
                        &answer.response,
                        &answer.metadata,
                    )
                    .await?;
                let elapsed_ms = start.elapsed().as_millis() as u64;
                info!(session_id = %session.id, elapsed_ms, phase = "completed", "Turn completed");
                Ok(TurnOutcome {
                    response: answer.response,
                    session_id: session.id,
                    elapsed_ms,
                    metadata: answer.metadata,
                })
            }
            Err(e) => {
                let content = format!("Error: {e}");
                let metadata = serde_json::json!({"error": true});
                if let Err(persist_err) = self
                    .history
                    .append_message(&session.id, ChatRole::Assistant, &content, &metadata)
                    .await
                {
                    error!(
                        session_id = %session.id,
                        error = %persist_err,
                        "Failed to persist assistant error message"
                    );
                }
                warn!(session_id = %session.id, error = %e, phase = "failed", "Turn failed");
                Err(e)
            }
        }
    }

    /// Run the handlers in resolved order over a fresh context, stopping at
    /// the first failure.
    async fn dispatch(
        &self,
        definition: &WorkflowDefinition,
        order: &[String],
        query: &str,
    ) -> Result<Answer> {
        let mut ctx = ExecutionContext::new(query);
        let components: HashMap<&str, &Component> = definition
            .components
            .iter()
            .map(|c| (c.id.as_str(), c))
            .collect();

        let scope = TurnScope {
            workflow_id: &definition.id,
            documents: self.documents.as_ref(),
            index: self.index.as_ref(),
            model: self.model.as_ref(),
            defaults: &self.config,
        };

        for component_id in order {
            let Some(component) = components.get(component_id.as_str()) else {
                continue;
            };
            match self.registry.get(&component.kind) {
                Some(handler) => {
                    debug!(component_id = %component.id, kind = %component.kind, "Executing component");
                    handler.run(&scope, &component.config, &mut ctx).await?;
                }
                None => {
                    warn!(
                        component_id = %component.id,
                        kind = %component.kind,
                        "No handler registered for component kind, skipping"
                    );
                }
            }
        }

        Ok(ctx.answer.take().unwrap_or_else(|| Answer {
            response: FALLBACK_RESPONSE.to_string(),
            metadata: serde_json::json!({}),
        }))
    }
}
