use futures::future::BoxFuture;
use tracing::debug;

use vireo_core::error::Result;
use vireo_core::workflow::KIND_USER_QUERY;

use super::{ComponentConfig, ComponentHandler, TurnScope};
use crate::context::ExecutionContext;

/// Query intake. The orchestrator seeds the context with the verbatim turn
/// query; this handler re-asserts it so downstream components can rely on
/// `ctx.query` regardless of where intake sits in the order. No failure modes.
pub struct UserQueryHandler;

impl ComponentHandler for UserQueryHandler {
    fn kind(&self) -> &'static str {
        KIND_USER_QUERY
    }

    fn run<'a>(
        &'a self,
        _scope: &'a TurnScope<'a>,
        _config: &'a ComponentConfig,
        ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            debug!(query_len = ctx.query.len(), "User query component passed through");
            Ok(())
        })
    }
}
