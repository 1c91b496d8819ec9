use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use rusqlite::{params, Connection};
use tracing::debug;

use vireo_core::error::{Result, VireoError};
use vireo_core::traits::{ChatHistoryStore, DocumentStore, WorkflowStore};
use vireo_core::types::{ChatRecord, ChatRole, ChatSession, DocumentRef, SessionId};
use vireo_core::workflow::WorkflowDefinition;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS workflows (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        definition TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS documents (
        id TEXT PRIMARY KEY,
        workflow_id TEXT NOT NULL,
        filename TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_documents_workflow ON documents(workflow_id);

    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        workflow_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, id);
";

/// SQLite-backed workflow, document, and chat-history storage.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VireoError::Database(format!("Failed to create db directory: {e}")))?;
        }

        let conn =
            Connection::open(path).map_err(|e| VireoError::Database(e.to_string()))?;

        // WAL for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| VireoError::Database(e.to_string()))?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| VireoError::Database(e.to_string()))?;

        debug!(path = %path.display(), "SQLite store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| VireoError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| VireoError::Database(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VireoError::Database(e.to_string()))
    }

    /// Insert or replace a workflow definition.
    pub fn insert_workflow(&self, definition: &WorkflowDefinition) -> Result<()> {
        let conn = self.lock()?;
        let json = serde_json::to_string(definition)?;
        conn.execute(
            "INSERT OR REPLACE INTO workflows (id, name, description, definition, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                definition.id,
                definition.name,
                definition.description,
                json,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| VireoError::Database(e.to_string()))?;
        Ok(())
    }

    /// List all stored workflow definitions.
    pub fn list_workflows(&self) -> Result<Vec<WorkflowDefinition>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT definition FROM workflows ORDER BY created_at, id")
            .map_err(|e| VireoError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| VireoError::Database(e.to_string()))?;

        let mut definitions = Vec::new();
        for row in rows {
            let json = row.map_err(|e| VireoError::Database(e.to_string()))?;
            definitions.push(serde_json::from_str(&json)?);
        }
        Ok(definitions)
    }

    /// Delete a workflow and everything hanging off it: documents, sessions,
    /// and session messages. Returns false when the workflow was unknown.
    pub fn delete_workflow(&self, workflow_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM messages WHERE session_id IN
                (SELECT id FROM sessions WHERE workflow_id = ?1)",
            params![workflow_id],
        )
        .map_err(|e| VireoError::Database(e.to_string()))?;
        conn.execute("DELETE FROM sessions WHERE workflow_id = ?1", params![workflow_id])
            .map_err(|e| VireoError::Database(e.to_string()))?;
        conn.execute("DELETE FROM documents WHERE workflow_id = ?1", params![workflow_id])
            .map_err(|e| VireoError::Database(e.to_string()))?;
        let deleted = conn
            .execute("DELETE FROM workflows WHERE id = ?1", params![workflow_id])
            .map_err(|e| VireoError::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    /// Bind a document to a workflow's knowledge base.
    pub fn insert_document(&self, workflow_id: &str, document: &DocumentRef) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO documents (id, workflow_id, filename, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                document.id,
                workflow_id,
                document.filename,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(|e| VireoError::Database(e.to_string()))?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl WorkflowStore for SqliteStore {
    fn get(&self, workflow_id: &str) -> BoxFuture<'_, Result<Option<WorkflowDefinition>>> {
        let workflow_id = workflow_id.to_string();
        Box::pin(async move {
            let conn = self.lock()?;
            let mut stmt = conn
                .prepare("SELECT definition FROM workflows WHERE id = ?1")
                .map_err(|e| VireoError::Database(e.to_string()))?;

            let mut rows = stmt
                .query_map(params![workflow_id], |row| row.get::<_, String>(0))
                .map_err(|e| VireoError::Database(e.to_string()))?;

            match rows.next() {
                Some(row) => {
                    let json = row.map_err(|e| VireoError::Database(e.to_string()))?;
                    Ok(Some(serde_json::from_str(&json)?))
                }
                None => Ok(None),
            }
        })
    }
}

impl DocumentStore for SqliteStore {
    fn list_by_workflow(&self, workflow_id: &str) -> BoxFuture<'_, Result<Vec<DocumentRef>>> {
        let workflow_id = workflow_id.to_string();
        Box::pin(async move {
            let conn = self.lock()?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, filename FROM documents
                     WHERE workflow_id = ?1
                     ORDER BY created_at, id",
                )
                .map_err(|e| VireoError::Database(e.to_string()))?;

            let rows = stmt
                .query_map(params![workflow_id], |row| {
                    Ok(DocumentRef {
                        id: row.get(0)?,
                        filename: row.get(1)?,
                    })
                })
                .map_err(|e| VireoError::Database(e.to_string()))?;

            let mut documents = Vec::new();
            for row in rows {
                documents.push(row.map_err(|e| VireoError::Database(e.to_string()))?);
            }
            Ok(documents)
        })
    }
}

impl ChatHistoryStore for SqliteStore {
    fn create_session(&self, workflow_id: &str) -> BoxFuture<'_, Result<ChatSession>> {
        let session = ChatSession::new(workflow_id);
        Box::pin(async move {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO sessions (id, workflow_id, created_at) VALUES (?1, ?2, ?3)",
                params![
                    session.id.0,
                    session.workflow_id,
                    session.created_at.to_rfc3339()
                ],
            )
            .map_err(|e| VireoError::Database(e.to_string()))?;
            Ok(session)
        })
    }

    fn get_session(&self, session_id: &SessionId) -> BoxFuture<'_, Result<Option<ChatSession>>> {
        let session_id = session_id.clone();
        Box::pin(async move {
            let conn = self.lock()?;
            let mut stmt = conn
                .prepare("SELECT id, workflow_id, created_at FROM sessions WHERE id = ?1")
                .map_err(|e| VireoError::Database(e.to_string()))?;

            let mut rows = stmt
                .query_map(params![session_id.0], |row| {
                    let id: String = row.get(0)?;
                    let workflow_id: String = row.get(1)?;
                    let created_at: String = row.get(2)?;
                    Ok((id, workflow_id, created_at))
                })
                .map_err(|e| VireoError::Database(e.to_string()))?;

            match rows.next() {
                Some(row) => {
                    let (id, workflow_id, created_at) =
                        row.map_err(|e| VireoError::Database(e.to_string()))?;
                    Ok(Some(ChatSession {
                        id: SessionId(id),
                        workflow_id,
                        created_at: parse_timestamp(&created_at),
                    }))
                }
                None => Ok(None),
            }
        })
    }

    fn append_message(
        &self,
        session_id: &SessionId,
        role: ChatRole,
        content: &str,
        metadata: &serde_json::Value,
    ) -> BoxFuture<'_, Result<()>> {
        let session_id = session_id.0.clone();
        let content = content.to_string();
        let metadata = metadata.to_string();
        Box::pin(async move {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO messages (session_id, role, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    session_id,
                    role.as_str(),
                    content,
                    metadata,
                    Utc::now().to_rfc3339()
                ],
            )
            .map_err(|e| VireoError::Database(e.to_string()))?;
            Ok(())
        })
    }

    fn load_history(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<ChatRecord>>> {
        let session_id = session_id.clone();
        Box::pin(async move {
            let conn = self.lock()?;
            let mut stmt = conn
                .prepare(
                    "SELECT id, role, content, metadata, created_at FROM messages
                     WHERE session_id = ?1
                     ORDER BY id ASC
                     LIMIT ?2",
                )
                .map_err(|e| VireoError::Database(e.to_string()))?;

            let rows = stmt
                .query_map(params![session_id.0, limit as i64], |row| {
                    let id: i64 = row.get(0)?;
                    let role: String = row.get(1)?;
                    let content: String = row.get(2)?;
                    let metadata: String = row.get(3)?;
                    let created_at: String = row.get(4)?;
                    Ok((id, role, content, metadata, created_at))
                })
                .map_err(|e| VireoError::Database(e.to_string()))?;

            let mut records = Vec::new();
            for row in rows {
                let (id, role, content, metadata, created_at) =
                    row.map_err(|e| VireoError::Database(e.to_string()))?;
                records.push(ChatRecord {
                    id,
                    session_id: session_id.clone(),
                    role: role.parse().unwrap_or(ChatRole::Assistant),
                    content,
                    metadata: serde_json::from_str(&metadata)
                        .unwrap_or(serde_json::Value::Null),
                    created_at: parse_timestamp(&created_at),
                });
            }
            Ok(records)
        })
    }
}
