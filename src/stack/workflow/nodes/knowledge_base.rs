// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::NodeHandler;
use crate::adk::error::Result;
use crate::adk::retrieval::Retrieval;
use crate::stack::workflow::context::ExecutionContext;
use crate::stack::workflow::result::NodeResult;
use crate::stack::workflow::types::Node;

/// Settings of a knowledge-base node
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,
    /// Metadata filter passed through to the vector store
    #[serde(default)]
    pub filter: Option<Value>,
}

fn default_top_k() -> usize {
    5
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}

impl KnowledgeBaseConfig {
    pub fn from_node(node: &Node) -> Result<Self> {
        let config = Value::Object(node.config().clone());
        Ok(serde_json::from_value(config)?)
    }
}

/// Retrieves documents relevant to the user input
pub struct KnowledgeBaseNode {
    retrieval: Arc<dyn Retrieval>,
}

impl KnowledgeBaseNode {
    pub fn new(retrieval: Arc<dyn Retrieval>) -> Self {
        Self { retrieval }
    }
}

#[async_trait]
impl NodeHandler for KnowledgeBaseNode {
    async fn execute(&self, node: &Node, context: &ExecutionContext) -> Result<NodeResult> {
        let config = KnowledgeBaseConfig::from_node(node)?;
        log::info!(
            "Knowledge base node {}: top {} via '{}'",
            node.id,
            config.top_k,
            config.embedding_provider
        );

        let results = self
            .retrieval
            .search_by_text(
                &context.user_input,
                &config.embedding_provider,
                config.top_k,
                config.filter.as_ref(),
            )
            .await?;

        Ok(NodeResult::KnowledgeBase {
            documents: results.documents,
            relevance_scores: results.distances,
            metadata: results.metadatas,
        })
    }
}
