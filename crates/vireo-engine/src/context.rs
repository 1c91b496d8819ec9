use vireo_core::types::ModelReply;

/// Turn-scoped accumulator shared by the component handlers.
///
/// Created fresh per execution and discarded at turn end; never persisted.
/// The fields are a fixed, typed record rather than a keyed map so a handler
/// cannot clobber another's output through a typo'd key.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// The verbatim turn query.
    pub query: String,
    /// Joined retrieval text. `Some("")` when retrieval ran but found nothing,
    /// `None` when no knowledge-base component ran.
    pub retrieved_text: Option<String>,
    /// Distinct source filenames, first-seen order.
    pub sources: Vec<String>,
    /// The language-model generation, once an llm_engine component ran.
    pub model_reply: Option<ModelReply>,
    /// The final formatted answer, written by the output component.
    pub answer: Option<Answer>,
}

impl ExecutionContext {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Whether retrieval produced any usable text.
    pub fn has_retrieval(&self) -> bool {
        self.retrieved_text
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }
}

/// The formatted response plus its structured metadata for persistence.
#[derive(Debug, Clone)]
pub struct Answer {
    pub response: String,
    pub metadata: serde_json::Value,
}
