use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::*;
use crate::workflow::WorkflowDefinition;

/// Workflow definition storage. The engine only reads; editing lives elsewhere.
pub trait WorkflowStore: Send + Sync + 'static {
    /// Fetch a definition by id. `None` when unknown.
    fn get(&self, workflow_id: &str) -> BoxFuture<'_, Result<Option<WorkflowDefinition>>>;
}

/// Documents bound to a workflow's knowledge base.
pub trait DocumentStore: Send + Sync + 'static {
    fn list_by_workflow(&self, workflow_id: &str) -> BoxFuture<'_, Result<Vec<DocumentRef>>>;
}

/// Vector index over document chunks.
pub trait VectorIndex: Send + Sync + 'static {
    /// Ranked similarity search scoped to one document.
    fn search_similar(
        &self,
        query: &str,
        k: usize,
        document_id: &str,
    ) -> BoxFuture<'_, Result<Vec<ScoredChunk>>>;

    /// Replace all chunks stored for a document. Returns the chunk count.
    /// Used by ingestion, not by turn execution.
    fn upsert(
        &self,
        document_id: &str,
        chunks: &[String],
        metadata: &serde_json::Value,
    ) -> BoxFuture<'_, Result<usize>>;

    /// Drop every chunk of a document.
    fn delete_by_document(&self, document_id: &str) -> BoxFuture<'_, Result<()>>;
}

/// Language-model generation with an ordered candidate fallback list.
pub trait LanguageModel: Send + Sync + 'static {
    /// Try `candidates` in order and return the first non-empty reply.
    /// Fails with an upstream error when every candidate is exhausted.
    fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        candidates: &[String],
        temperature: f32,
    ) -> BoxFuture<'_, Result<ModelReply>>;
}

/// Chat session and message persistence.
pub trait ChatHistoryStore: Send + Sync + 'static {
    /// Create a fresh session bound to a workflow.
    fn create_session(&self, workflow_id: &str) -> BoxFuture<'_, Result<ChatSession>>;

    /// Load a session by id. `None` when unknown.
    fn get_session(&self, session_id: &SessionId) -> BoxFuture<'_, Result<Option<ChatSession>>>;

    /// Append one message to a session. Append-only; never reordered.
    fn append_message(
        &self,
        session_id: &SessionId,
        role: ChatRole,
        content: &str,
        metadata: &serde_json::Value,
    ) -> BoxFuture<'_, Result<()>>;

    /// Load a session transcript in creation order.
    fn load_history(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ChatRecord>>>;
}
