//! Workflow definition types
//!
//! A workflow is a list of nodes and a list of edges, usually authored in a
//! visual editor. Editors wrap nodes in a generic `custom` marker and keep the
//! real kind under `data.type`; that wrapper is resolved here, once, when the
//! definition is deserialized.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Generic wrapper marker used by the authoring surface
pub const CUSTOM_NODE_MARKER: &str = "custom";

/// A workflow definition as supplied by the caller
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct WorkflowConfig {
    /// Identifier of the stored workflow, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Nodes in declaration order
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges; `target` depends on `source`
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// The closed set of node kinds the engine can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    UserQuery,
    KnowledgeBase,
    LlmEngine,
    WebSearch,
    Output,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::UserQuery,
        NodeKind::KnowledgeBase,
        NodeKind::LlmEngine,
        NodeKind::WebSearch,
        NodeKind::Output,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::UserQuery => "user_query",
            NodeKind::KnowledgeBase => "knowledge_base",
            NodeKind::LlmEngine => "llm_engine",
            NodeKind::WebSearch => "web_search",
            NodeKind::Output => "output",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective type of a node after unwrapping the `custom` marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Known(NodeKind),
    /// Type outside the supported set; `None` when no type could be read
    Unknown(Option<String>),
}

impl NodeType {
    /// Resolve the effective type from the direct `type` and the nested `data.type`
    pub fn resolve(direct: Option<&str>, nested: Option<&str>) -> Self {
        let effective = match direct {
            Some(CUSTOM_NODE_MARKER) => nested,
            other => other,
        };
        match effective.and_then(NodeKind::parse) {
            Some(kind) => NodeType::Known(kind),
            None => NodeType::Unknown(effective.map(str::to_string)),
        }
    }

    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            NodeType::Known(kind) => Some(*kind),
            NodeType::Unknown(_) => None,
        }
    }

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind() == Some(kind)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeType::Known(kind) => write!(f, "{}", kind),
            NodeType::Unknown(Some(name)) => f.write_str(name),
            NodeType::Unknown(None) => f.write_str("<missing>"),
        }
    }
}

/// Payload carried by every node
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct NodeData {
    /// Logical type, used when the node is wrapped in the `custom` marker
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Display label from the editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Kind-specific settings
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// A node in the workflow graph
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(from = "RawNode", into = "RawNode")]
pub struct Node {
    pub id: String,
    pub node_type: NodeType,
    pub data: NodeData,
    /// Type exactly as authored, kept so the definition serializes unchanged
    declared_type: Option<String>,
}

impl Node {
    /// Create a node of a known kind with an empty config
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            node_type: NodeType::Known(kind),
            data: NodeData::default(),
            declared_type: Some(kind.as_str().to_string()),
        }
    }

    /// Create a node wrapped in the `custom` marker
    pub fn custom(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            node_type: NodeType::Known(kind),
            data: NodeData {
                node_type: Some(kind.as_str().to_string()),
                ..NodeData::default()
            },
            declared_type: Some(CUSTOM_NODE_MARKER.to_string()),
        }
    }

    /// Attach config entries from a JSON object; non-object values are ignored
    pub fn with_config(mut self, config: Value) -> Self {
        if let Value::Object(map) = config {
            self.data.config = map;
        }
        self
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.data.config
    }

    /// Non-empty string config value
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.data
            .config
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// Wire shape of a node
#[derive(Debug, Clone, Deserialize, Serialize)]
struct RawNode {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    node_type: Option<String>,
    #[serde(default)]
    data: NodeData,
}

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let node_type = NodeType::resolve(raw.node_type.as_deref(), raw.data.node_type.as_deref());
        Self {
            id: raw.id,
            node_type,
            data: raw.data,
            declared_type: raw.node_type,
        }
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            node_type: node.declared_type,
            data: node.data,
        }
    }
}

/// A directed edge; `target` depends on `source`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direct_type_resolves() {
        let node: Node = serde_json::from_value(json!({
            "id": "q",
            "type": "user_query",
            "data": { "config": {} }
        }))
        .unwrap();
        assert_eq!(node.node_type, NodeType::Known(NodeKind::UserQuery));
    }

    #[test]
    fn test_custom_wrapper_unwraps_nested_type() {
        let node: Node = serde_json::from_value(json!({
            "id": "llm",
            "type": "custom",
            "data": {
                "type": "llm_engine",
                "label": "LLM",
                "config": { "model": "gpt-4o" }
            }
        }))
        .unwrap();
        assert_eq!(node.node_type, NodeType::Known(NodeKind::LlmEngine));
        assert_eq!(node.config_str("model"), Some("gpt-4o"));
    }

    #[test]
    fn test_nested_type_ignored_without_wrapper() {
        // Only the `custom` marker defers to data.type
        let node: Node = serde_json::from_value(json!({
            "id": "x",
            "type": "mystery",
            "data": { "type": "output" }
        }))
        .unwrap();
        let expected = NodeType::Unknown(Some("mystery".to_string()));
        assert_eq!(node.node_type, expected);
    }

    #[test]
    fn test_missing_type_is_unknown() {
        let node: Node = serde_json::from_value(json!({ "id": "x" })).unwrap();
        assert_eq!(node.node_type, NodeType::Unknown(None));
        assert_eq!(node.node_type.to_string(), "<missing>");
    }

    #[test]
    fn test_custom_marker_survives_serialization() {
        let node = Node::custom("o", NodeKind::Output);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "custom");
        assert_eq!(value["data"]["type"], "output");
    }

    #[test]
    fn test_workflow_defaults_and_extra_edge_fields() {
        let config: WorkflowConfig = serde_json::from_value(json!({
            "edges": [{
                "id": "e1",
                "source": "a",
                "target": "b",
                "sourceHandle": "out",
                "animated": true
            }]
        }))
        .unwrap();
        assert!(config.id.is_none());
        assert!(config.nodes.is_empty());
        assert_eq!(config.edges[0].source, "a");
        assert_eq!(config.edges[0].id.as_deref(), Some("e1"));
    }

    #[test]
    fn test_config_str_skips_empty_and_non_string() {
        let node = Node::new("l", NodeKind::LlmEngine)
            .with_config(json!({ "apiKey": "", "temperature": 0.3 }));
        assert_eq!(node.config_str("apiKey"), None);
        assert_eq!(node.config_str("temperature"), None);
    }
}
