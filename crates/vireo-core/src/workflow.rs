use serde::{Deserialize, Serialize};

/// Component kind strings understood by the built-in handlers.
///
/// The set is open: the handler registry can be extended with new kinds
/// without touching the orchestrator.
pub const KIND_USER_QUERY: &str = "user_query";
pub const KIND_KNOWLEDGE_BASE: &str = "knowledge_base";
pub const KIND_LLM_ENGINE: &str = "llm_engine";
pub const KIND_OUTPUT: &str = "output";

/// A user-assembled workflow: typed components wired by directed connections.
///
/// The component sequence order is display-only; execution order is derived
/// from the connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// A single node of the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Unique within the owning definition.
    pub id: String,
    /// Component kind, dispatched through the handler registry.
    #[serde(rename = "type")]
    pub kind: String,
    /// Editor canvas position. Opaque passthrough, never read by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Handler-owned configuration. Semantics belong to the handler for `kind`.
    #[serde(rename = "data", default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

impl Component {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            position: None,
            config: serde_json::Map::new(),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

/// Editor canvas coordinates. Passthrough only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A directed connection between two components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Source component id. Legacy payloads use `source_id`.
    #[serde(alias = "source_id")]
    pub source: String,
    /// Target component id. Legacy payloads use `target_id`.
    #[serde(alias = "target_id")]
    pub target: String,
    /// Editor handle anchors. Passthrough only.
    #[serde(default, alias = "sourceHandle", skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, alias = "targetHandle", skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_wire_shape() {
        let json = r#"{
            "id": "kb-1",
            "type": "knowledge_base",
            "position": {"x": 120.0, "y": 40.5},
            "data": {"result_count": 5, "pass_to_llm": true}
        }"#;

        let comp: Component = serde_json::from_str(json).unwrap();
        assert_eq!(comp.id, "kb-1");
        assert_eq!(comp.kind, KIND_KNOWLEDGE_BASE);
        assert_eq!(comp.config["result_count"], serde_json::json!(5));
        assert!(comp.position.is_some());
    }

    #[test]
    fn test_connection_legacy_field_names() {
        let json = r#"{"source_id": "a", "target_id": "b"}"#;
        let conn: Connection = serde_json::from_str(json).unwrap();
        assert_eq!(conn.source, "a");
        assert_eq!(conn.target, "b");

        let json = r#"{"source": "a", "target": "b", "sourceHandle": null}"#;
        let conn: Connection = serde_json::from_str(json).unwrap();
        assert_eq!(conn.source, "a");
    }

    #[test]
    fn test_definition_roundtrip() {
        let def = WorkflowDefinition {
            id: "wf-1".into(),
            name: "RAG chat".into(),
            description: None,
            components: vec![
                Component::new("q", KIND_USER_QUERY),
                Component::new("out", KIND_OUTPUT),
            ],
            connections: vec![Connection::new("q", "out")],
        };

        let json = serde_json::to_string(&def).unwrap();
        let parsed: WorkflowDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.components.len(), 2);
        assert_eq!(parsed.connections[0].source, "q");
        // `type` stays the wire field name for the kind
        assert!(json.contains(r#""type":"user_query""#));
    }
}
