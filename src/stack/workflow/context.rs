// SPDX-License-Identifier: MIT

//! Per-run execution context

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::result::{NodeResult, ResultKind};

/// Node results keyed by node id, in commit order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeResults {
    entries: Vec<(String, NodeResult)>,
}

impl NodeResults {
    /// Store a result; a second commit for the same id replaces the first in place
    pub fn insert(&mut self, node_id: impl Into<String>, result: NodeResult) {
        let node_id = node_id.into();
        match self.entries.iter_mut().find(|(id, _)| *id == node_id) {
            Some(entry) => entry.1 = result,
            None => self.entries.push((node_id, result)),
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&NodeResult> {
        self.entries
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, r)| r)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.get(node_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeResult)> {
        self.entries.iter().map(|(id, r)| (id.as_str(), r))
    }

    pub fn values(&self) -> impl Iterator<Item = &NodeResult> {
        self.entries.iter().map(|(_, r)| r)
    }
}

impl Serialize for NodeResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, result) in &self.entries {
            map.serialize_entry(id, result)?;
        }
        map.end()
    }
}

/// Run metadata
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionMetadata {
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub workflow_id: Option<String>,
}

/// State threaded through one workflow run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    pub user_input: String,
    pub session_id: Option<String>,
    pub results: NodeResults,
    pub metadata: ExecutionMetadata,
}

impl ExecutionContext {
    pub fn new(
        user_input: impl Into<String>,
        session_id: Option<String>,
        workflow_id: Option<String>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            session_id,
            results: NodeResults::default(),
            metadata: ExecutionMetadata {
                start_time: Utc::now(),
                end_time: None,
                workflow_id,
            },
        }
    }

    /// First committed result of the given kind, regardless of graph edges.
    ///
    /// Handlers use this to pick up sibling output by type rather than by
    /// declared dependency; keep such lookups going through here.
    pub fn first_result_of_type(&self, kind: ResultKind) -> Option<&NodeResult> {
        self.results.values().find(|r| r.kind() == kind)
    }

    /// All committed results of the given kind, in commit order
    pub fn results_of_type(&self, kind: ResultKind) -> impl Iterator<Item = &NodeResult> {
        self.results.values().filter(move |r| r.kind() == kind)
    }

    pub fn commit(&mut self, node_id: impl Into<String>, result: NodeResult) {
        self.results.insert(node_id, result);
    }

    pub fn error_count(&self) -> usize {
        self.results_of_type(ResultKind::Error).count()
    }

    /// Stamp the end of the run
    pub fn finish(&mut self) {
        self.metadata.end_time = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm(content: &str) -> NodeResult {
        NodeResult::LlmResponse {
            content: content.to_string(),
            model: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_first_result_of_type_follows_commit_order() {
        let mut ctx = ExecutionContext::new("q", None, None);
        ctx.commit("z", llm("first"));
        ctx.commit("a", llm("second"));

        let first = ctx.first_result_of_type(ResultKind::LlmResponse).unwrap();
        assert_eq!(first.content(), Some("first"));
        let kb = ctx.first_result_of_type(ResultKind::KnowledgeBase);
        assert!(kb.is_none());
    }

    #[test]
    fn test_results_of_type_and_error_count() {
        let mut ctx = ExecutionContext::new("q", Some("s1".to_string()), None);
        ctx.commit("a", llm("one"));
        ctx.commit("b", NodeResult::error("failed"));
        ctx.commit("c", llm("two"));

        let contents: Vec<_> = ctx
            .results_of_type(ResultKind::LlmResponse)
            .filter_map(|r| r.content())
            .collect();
        assert_eq!(contents, vec!["one", "two"]);
        assert_eq!(ctx.error_count(), 1);
    }

    #[test]
    fn test_commit_replaces_in_place() {
        let mut results = NodeResults::default();
        results.insert("a", llm("old"));
        results.insert("b", llm("b"));
        results.insert("a", llm("new"));

        assert_eq!(results.len(), 2);
        let ids: Vec<_> = results.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(results.get("a").and_then(|r| r.content()), Some("new"));
    }

    #[test]
    fn test_serializes_results_as_ordered_map() {
        let mut ctx = ExecutionContext::new("hello", None, Some("wf".to_string()));
        ctx.commit("b", NodeResult::error("x"));
        ctx.commit("a", llm("y"));
        ctx.finish();

        let json = serde_json::to_string(&ctx).unwrap();
        let b_pos = json.find("\"b\"").unwrap();
        let a_pos = json.find("\"a\"").unwrap();
        assert!(b_pos < a_pos);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["workflow_id"], "wf");
        assert!(value["metadata"]["end_time"].is_string());
    }
}
