// SPDX-License-Identifier: MIT

//! Structural validation of workflow definitions
//!
//! Validation is pure: it never touches collaborators and returns the same
//! result for the same definition.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::types::{NodeKind, NodeType, WorkflowConfig};

/// Outcome of validating a workflow definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate a workflow definition before execution.
///
/// Errors make the workflow unexecutable; warnings (an LLM node without an
/// API key, which may still fall back to a configured key) do not.
pub fn validate(config: &WorkflowConfig) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if config.nodes.is_empty() {
        errors.push("Workflow must have at least one node".to_string());
    }

    for node in &config.nodes {
        if let NodeType::Unknown(_) = node.node_type {
            errors.push(format!("Invalid node type: {}", node.node_type));
        }
    }

    let has_kind = |kind: NodeKind| config.nodes.iter().any(|n| n.node_type.is(kind));

    if !has_kind(NodeKind::UserQuery) {
        errors.push("Workflow must have at least one User Query node".into());
    }
    if !has_kind(NodeKind::Output) {
        errors.push("Workflow must have at least one Output node".into());
    }

    let node_ids: HashSet<&str> = config.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &config.edges {
        if !node_ids.contains(edge.source.as_str()) {
            errors.push(format!("Invalid edge source: {}", edge.source));
        }
        if !node_ids.contains(edge.target.as_str()) {
            errors.push(format!("Invalid edge target: {}", edge.target));
        }
    }

    for node in config
        .nodes
        .iter()
        .filter(|n| n.node_type.is(NodeKind::LlmEngine))
    {
        if node.config_str("apiKey").is_none() {
            warnings.push(format!("LLM node {} missing API key", node.id));
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::workflow::types::{Edge, Node};
    use serde_json::json;

    fn minimal() -> WorkflowConfig {
        WorkflowConfig {
            id: None,
            nodes: vec![
                Node::new("q", NodeKind::UserQuery),
                Node::new("o", NodeKind::Output),
            ],
            edges: vec![Edge::new("q", "o")],
        }
    }

    #[test]
    fn test_minimal_workflow_is_valid() {
        let result = validate(&minimal());
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_empty_workflow_reports_all_missing_parts() {
        let result = validate(&WorkflowConfig::default());
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "Workflow must have at least one node",
                "Workflow must have at least one User Query node",
                "Workflow must have at least one Output node",
            ]
        );
    }

    #[test]
    fn test_missing_user_query() {
        let mut config = minimal();
        config.nodes.remove(0);
        config.edges.clear();

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("User Query")));
    }

    #[test]
    fn test_missing_output() {
        let mut config = minimal();
        config.nodes.pop();
        config.edges.clear();

        let result = validate(&config);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("Output")));
    }

    #[test]
    fn test_unknown_edge_endpoints_named() {
        let mut config = minimal();
        config.edges.push(Edge::new("ghost", "o"));
        config.edges.push(Edge::new("q", "phantom"));

        let result = validate(&config);
        assert!(!result.valid);
        let source = "Invalid edge source: ghost".to_string();
        let target = "Invalid edge target: phantom".to_string();
        assert!(result.errors.contains(&source));
        assert!(result.errors.contains(&target));
    }

    #[test]
    fn test_invalid_node_type() {
        let config: WorkflowConfig = serde_json::from_value(json!({
            "nodes": [
                { "id": "q", "type": "user_query" },
                { "id": "o", "type": "output" },
                { "id": "x", "type": "custom", "data": { "type": "image_gen" } }
            ]
        }))
        .unwrap();

        let result = validate(&config);
        assert_eq!(result.errors, vec!["Invalid node type: image_gen"]);
    }

    #[test]
    fn test_wrapped_kinds_count_as_present() {
        let config = WorkflowConfig {
            id: None,
            nodes: vec![
                Node::custom("q", NodeKind::UserQuery),
                Node::custom("o", NodeKind::Output),
            ],
            edges: vec![],
        };
        assert!(validate(&config).valid);
    }

    #[test]
    fn test_llm_without_api_key_is_warning_only() {
        let mut config = minimal();
        config.nodes.push(Node::new("l1", NodeKind::LlmEngine));
        let key = json!({ "apiKey": "sk-test" });
        let keyed = Node::new("l2", NodeKind::LlmEngine).with_config(key);
        config.nodes.push(keyed);

        let result = validate(&config);
        assert!(result.valid);
        assert_eq!(result.warnings, vec!["LLM node l1 missing API key"]);
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut config = minimal();
        config.edges.push(Edge::new("nope", "o"));
        config.nodes.push(Node::new("l", NodeKind::LlmEngine));

        assert_eq!(validate(&config), validate(&config));
    }
}
