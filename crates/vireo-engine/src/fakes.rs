//! In-memory collaborator fakes for engine tests.

use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::BoxFuture;

use vireo_core::config::EngineConfig;
use vireo_core::error::{Result, VireoError};
use vireo_core::traits::*;
use vireo_core::types::*;
use vireo_core::workflow::{
    Component, Connection, WorkflowDefinition, KIND_KNOWLEDGE_BASE, KIND_LLM_ENGINE, KIND_OUTPUT,
    KIND_USER_QUERY,
};

use crate::handlers::TurnScope;

pub(crate) struct FakeWorkflowStore {
    pub definitions: HashMap<String, WorkflowDefinition>,
}

impl FakeWorkflowStore {
    pub fn with(definition: WorkflowDefinition) -> Self {
        let mut definitions = HashMap::new();
        definitions.insert(definition.id.clone(), definition);
        Self { definitions }
    }
}

impl WorkflowStore for FakeWorkflowStore {
    fn get(&self, workflow_id: &str) -> BoxFuture<'_, Result<Option<WorkflowDefinition>>> {
        let found = self.definitions.get(workflow_id).cloned();
        Box::pin(async move { Ok(found) })
    }
}

#[derive(Default)]
pub(crate) struct FakeDocumentStore {
    pub documents: Vec<DocumentRef>,
}

impl DocumentStore for FakeDocumentStore {
    fn list_by_workflow(&self, _workflow_id: &str) -> BoxFuture<'_, Result<Vec<DocumentRef>>> {
        let docs = self.documents.clone();
        Box::pin(async move { Ok(docs) })
    }
}

/// Canned per-document hits, returned already ranked.
#[derive(Default)]
pub(crate) struct FakeVectorIndex {
    pub hits: HashMap<String, Vec<ScoredChunk>>,
    pub fail: bool,
}

impl VectorIndex for FakeVectorIndex {
    fn search_similar(
        &self,
        _query: &str,
        k: usize,
        document_id: &str,
    ) -> BoxFuture<'_, Result<Vec<ScoredChunk>>> {
        let fail = self.fail;
        let mut hits = self.hits.get(document_id).cloned().unwrap_or_default();
        hits.truncate(k);
        Box::pin(async move {
            if fail {
                return Err(VireoError::Upstream("vector index unavailable".into()));
            }
            Ok(hits)
        })
    }

    fn upsert(
        &self,
        _document_id: &str,
        chunks: &[String],
        _metadata: &serde_json::Value,
    ) -> BoxFuture<'_, Result<usize>> {
        let n = chunks.len();
        Box::pin(async move { Ok(n) })
    }

    fn delete_by_document(&self, _document_id: &str) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move { Ok(()) })
    }
}

pub(crate) struct GenerateCall {
    pub system_prompt: String,
    pub user_message: String,
    pub candidates: Vec<String>,
    pub temperature: f32,
}

/// Echoes a canned reply and records every call; `fail_all` simulates an
/// exhausted candidate list.
pub(crate) struct FakeLanguageModel {
    pub reply_text: String,
    pub fail_all: bool,
    pub calls: Mutex<Vec<GenerateCall>>,
}

impl Default for FakeLanguageModel {
    fn default() -> Self {
        Self {
            reply_text: "X is a placeholder.".into(),
            fail_all: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl LanguageModel for FakeLanguageModel {
    fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        candidates: &[String],
        temperature: f32,
    ) -> BoxFuture<'_, Result<ModelReply>> {
        let call = GenerateCall {
            system_prompt: system_prompt.to_string(),
            user_message: user_message.to_string(),
            candidates: candidates.to_vec(),
            temperature,
        };
        let model_used = candidates.first().cloned().unwrap_or_else(|| "fake-model".into());
        Box::pin(async move {
            self.calls.lock().unwrap().push(call);
            if self.fail_all {
                return Err(VireoError::Upstream(
                    "All candidate models failed: fake outage".into(),
                ));
            }
            Ok(ModelReply {
                text: self.reply_text.clone(),
                model_used,
                provider: "fake".into(),
            })
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeHistoryStore {
    pub sessions: Mutex<HashMap<String, ChatSession>>,
    pub messages: Mutex<Vec<ChatRecord>>,
}

impl FakeHistoryStore {
    pub fn transcript(&self) -> Vec<ChatRecord> {
        self.messages.lock().unwrap().clone()
    }
}

impl ChatHistoryStore for FakeHistoryStore {
    fn create_session(&self, workflow_id: &str) -> BoxFuture<'_, Result<ChatSession>> {
        let session = ChatSession::new(workflow_id);
        Box::pin(async move {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.id.0.clone(), session.clone());
            Ok(session)
        })
    }

    fn get_session(&self, session_id: &SessionId) -> BoxFuture<'_, Result<Option<ChatSession>>> {
        let id = session_id.0.clone();
        Box::pin(async move { Ok(self.sessions.lock().unwrap().get(&id).cloned()) })
    }

    fn append_message(
        &self,
        session_id: &SessionId,
        role: ChatRole,
        content: &str,
        metadata: &serde_json::Value,
    ) -> BoxFuture<'_, Result<()>> {
        let session_id = session_id.clone();
        let content = content.to_string();
        let metadata = metadata.clone();
        Box::pin(async move {
            let mut messages = self.messages.lock().unwrap();
            let id = messages.len() as i64 + 1;
            messages.push(ChatRecord {
                id,
                session_id,
                role,
                content,
                metadata,
                created_at: chrono::Utc::now(),
            });
            Ok(())
        })
    }

    fn load_history(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ChatRecord>>> {
        let id = session_id.clone();
        Box::pin(async move {
            let mut records: Vec<ChatRecord> = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.session_id == id)
                .cloned()
                .collect();
            records.truncate(limit);
            Ok(records)
        })
    }
}

/// Bundles fake collaborators so handler tests can borrow a `TurnScope`.
pub(crate) struct ScopeFixture {
    pub documents: FakeDocumentStore,
    pub index: FakeVectorIndex,
    pub model: FakeLanguageModel,
    pub defaults: EngineConfig,
}

impl ScopeFixture {
    pub fn scope(&self) -> TurnScope<'_> {
        TurnScope {
            workflow_id: "wf-1",
            documents: &self.documents,
            index: &self.index,
            model: &self.model,
            defaults: &self.defaults,
        }
    }
}

pub(crate) fn scope_fixture() -> ScopeFixture {
    ScopeFixture {
        documents: FakeDocumentStore::default(),
        index: FakeVectorIndex::default(),
        model: FakeLanguageModel::default(),
        defaults: EngineConfig::default(),
    }
}

/// The canonical linear RAG workflow used across tests.
pub(crate) fn rag_definition() -> WorkflowDefinition {
    WorkflowDefinition {
        id: "wf-1".into(),
        name: "RAG chat".into(),
        description: None,
        components: vec![
            Component::new("q", KIND_USER_QUERY),
            Component::new("kb", KIND_KNOWLEDGE_BASE),
            Component::new("llm", KIND_LLM_ENGINE),
            Component::new("out", KIND_OUTPUT),
        ],
        connections: vec![
            Connection::new("q", "kb"),
            Connection::new("kb", "llm"),
            Connection::new("llm", "out"),
        ],
    }
}
