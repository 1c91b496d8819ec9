use thiserror::Error;

#[derive(Debug, Error)]
pub enum VireoError {
    // Pre-execution rejections — no durable side effects
    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("Chat session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid workflow: {}", errors.join("; "))]
    InvalidWorkflow { errors: Vec<String> },

    #[error("Cycle detected among components: {}", unresolved.join(", "))]
    CycleDetected { unresolved: Vec<String> },

    // Mid-execution failures — recorded as an assistant error message
    #[error("Upstream collaborator failed: {0}")]
    Upstream(String),

    #[error("Turn deadline exceeded after {limit_secs}s")]
    Timeout { limit_secs: u64 },

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VireoError {
    /// Whether this error was raised before any durable side effect.
    ///
    /// Errors that are not pre-execution leave a user message and an
    /// assistant error message in the session history.
    pub fn is_pre_execution(&self) -> bool {
        matches!(
            self,
            Self::WorkflowNotFound(_)
                | Self::SessionNotFound(_)
                | Self::InvalidWorkflow { .. }
                | Self::CycleDetected { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, VireoError>;
