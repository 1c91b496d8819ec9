use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique chat session identifier.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_str(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a chat message within a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("unknown chat role: {other}")),
        }
    }
}

/// A conversation bound to one workflow. Created lazily on the first turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub workflow_id: String,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            workflow_id: workflow_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// A persisted chat message. Append-only; session order is creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    pub session_id: SessionId,
    pub role: ChatRole,
    pub content: String,
    /// Structured metadata, e.g. `{"sources": [...]}` or `{"error": true}`.
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ChatRecord {
    /// Whether this record captures a failed assistant turn.
    pub fn is_error(&self) -> bool {
        self.metadata
            .get("error")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// A document bound to a workflow's knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub filename: String,
}

/// One ranked retrieval hit from the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
    pub chunk_index: usize,
}

/// A successful language-model generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReply {
    pub text: String,
    pub model_used: String,
    pub provider: String,
}

/// The result of executing one turn of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub response: String,
    pub session_id: SessionId,
    pub elapsed_ms: u64,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_unique() {
        assert_ne!(SessionId::new().0, SessionId::new().0);
    }

    #[test]
    fn test_role_roundtrip() {
        assert_eq!("user".parse::<ChatRole>().unwrap(), ChatRole::User);
        assert_eq!("assistant".parse::<ChatRole>().unwrap(), ChatRole::Assistant);
        assert!("tool".parse::<ChatRole>().is_err());
        assert_eq!(ChatRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_record_error_flag() {
        let mut record = ChatRecord {
            id: 1,
            session_id: SessionId::new(),
            role: ChatRole::Assistant,
            content: "Error: model down".into(),
            metadata: serde_json::json!({"error": true}),
            created_at: Utc::now(),
        };
        assert!(record.is_error());

        record.metadata = serde_json::json!({"sources": ["a.txt"]});
        assert!(!record.is_error());
    }
}
