// SPDX-License-Identifier: MIT

//! Node results produced by handlers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output of a single node, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeResult {
    UserQuery {
        content: String,
        timestamp: DateTime<Utc>,
    },
    KnowledgeBase {
        documents: Vec<String>,
        relevance_scores: Vec<f32>,
        metadata: Vec<Map<String, Value>>,
    },
    LlmResponse {
        content: String,
        model: Option<String>,
        timestamp: DateTime<Utc>,
    },
    WebSearch {
        results: Vec<Value>,
        query: String,
        message: String,
    },
    Output {
        content: String,
        timestamp: DateTime<Utc>,
    },
    /// Recorded in place of a result when the node's handler failed
    Error { error: String },
}

/// Discriminant of [`NodeResult`], used for type-based lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    UserQuery,
    KnowledgeBase,
    LlmResponse,
    WebSearch,
    Output,
    Error,
}

impl NodeResult {
    pub fn error(message: impl Into<String>) -> Self {
        NodeResult::Error {
            error: message.into(),
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            NodeResult::UserQuery { .. } => ResultKind::UserQuery,
            NodeResult::KnowledgeBase { .. } => ResultKind::KnowledgeBase,
            NodeResult::LlmResponse { .. } => ResultKind::LlmResponse,
            NodeResult::WebSearch { .. } => ResultKind::WebSearch,
            NodeResult::Output { .. } => ResultKind::Output,
            NodeResult::Error { .. } => ResultKind::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind() == ResultKind::Error
    }

    /// Text content for kinds that carry one
    pub fn content(&self) -> Option<&str> {
        match self {
            NodeResult::UserQuery { content, .. }
            | NodeResult::LlmResponse { content, .. }
            | NodeResult::Output { content, .. } => Some(content),
            _ => None,
        }
    }
}
