//! Workflow execution engine: validation, ordering, and dispatch.
//!
//! A workflow is a directed acyclic graph of typed components wired by
//! connections. Executing a turn means: validate the graph, resolve a
//! deterministic topological order, bind a chat session, then run each
//! component's handler in order against a shared `ExecutionContext`,
//! persisting the user/assistant message pair around dispatch.
//!
//! Handlers are looked up in a `HandlerRegistry` by component kind, so new
//! kinds plug in without touching the orchestrator. All external I/O goes
//! through the collaborator traits in `vireo-core`, injected into the
//! `WorkflowEngine` at construction.

pub mod context;
pub mod handlers;
pub mod order;
pub mod orchestrator;
pub mod validator;

#[cfg(test)]
pub(crate) mod fakes;

pub use context::{Answer, ExecutionContext};
pub use handlers::{ComponentHandler, HandlerRegistry, TurnScope};
pub use order::resolve_order;
pub use orchestrator::WorkflowEngine;
pub use validator::{validate, validate_strict, ValidationReport};
