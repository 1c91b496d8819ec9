//! Component handlers and their registry.
//!
//! Each component kind maps to one handler. A handler reads its component's
//! config, reads/writes the shared `ExecutionContext`, and reaches external
//! collaborators only through the `TurnScope`. Registering a new kind is all
//! it takes to extend the engine; the orchestrator never branches on kind.

pub mod knowledge_base;
pub mod llm_engine;
pub mod output;
pub mod user_query;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;

use vireo_core::config::EngineConfig;
use vireo_core::error::Result;
use vireo_core::traits::{DocumentStore, LanguageModel, VectorIndex};

use crate::context::ExecutionContext;

pub use knowledge_base::KnowledgeBaseHandler;
pub use llm_engine::LlmEngineHandler;
pub use output::OutputHandler;
pub use user_query::UserQueryHandler;

/// Component configuration as carried on the wire (`data` mapping).
pub type ComponentConfig = serde_json::Map<String, serde_json::Value>;

/// Everything a handler may touch during one turn besides the context.
pub struct TurnScope<'a> {
    /// The workflow being executed; scopes document and retrieval lookups.
    pub workflow_id: &'a str,
    pub documents: &'a dyn DocumentStore,
    pub index: &'a dyn VectorIndex,
    pub model: &'a dyn LanguageModel,
    pub defaults: &'a EngineConfig,
}

/// One component kind's execution logic.
pub trait ComponentHandler: Send + Sync + 'static {
    /// The component kind string this handler answers to.
    fn kind(&self) -> &'static str;

    /// Execute the component against the shared context.
    fn run<'a>(
        &'a self,
        scope: &'a TurnScope<'a>,
        config: &'a ComponentConfig,
        ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Kind-to-handler dispatch table.
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn ComponentHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// A registry wired with the four built-in handlers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(UserQueryHandler));
        registry.register(Arc::new(KnowledgeBaseHandler));
        registry.register(Arc::new(LlmEngineHandler));
        registry.register(Arc::new(OutputHandler));
        registry
    }

    /// Register a handler, replacing any previous one for the same kind.
    pub fn register(&mut self, handler: Arc<dyn ComponentHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn ComponentHandler>> {
        self.handlers.get(kind)
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Read a float config value, accepting both integer and float JSON numbers.
pub(crate) fn config_f32(config: &ComponentConfig, key: &str) -> Option<f32> {
    config.get(key).and_then(|v| v.as_f64()).map(|v| v as f32)
}

pub(crate) fn config_usize(config: &ComponentConfig, key: &str) -> Option<usize> {
    config.get(key).and_then(|v| v.as_u64()).map(|v| v as usize)
}

pub(crate) fn config_bool(config: &ComponentConfig, key: &str) -> Option<bool> {
    config.get(key).and_then(|v| v.as_bool())
}

pub(crate) fn config_str<'a>(config: &'a ComponentConfig, key: &str) -> Option<&'a str> {
    config.get(key).and_then(|v| v.as_str())
}
