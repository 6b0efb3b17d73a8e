// SPDX-License-Identifier: MIT

//! Routes each node to the handler for its kind

use std::sync::Arc;

use super::context::ExecutionContext;
use super::nodes::{
    KnowledgeBaseNode, LlmEngineNode, NodeHandler, OutputNode, UserQueryNode, WebSearchNode,
};
use super::result::NodeResult;
use super::types::{Node, NodeKind, NodeType};
use crate::adk::completion::Completion;
use crate::adk::error::{Result, WorkflowError};
use crate::adk::retrieval::Retrieval;

/// Holds one handler per node kind
pub struct NodeDispatcher {
    user_query: UserQueryNode,
    knowledge_base: KnowledgeBaseNode,
    llm_engine: LlmEngineNode,
    web_search: WebSearchNode,
    output: OutputNode,
}

impl NodeDispatcher {
    pub fn new(completion: Arc<dyn Completion>, retrieval: Arc<dyn Retrieval>) -> Self {
        Self {
            user_query: UserQueryNode,
            knowledge_base: KnowledgeBaseNode::new(retrieval),
            llm_engine: LlmEngineNode::new(completion),
            web_search: WebSearchNode,
            output: OutputNode,
        }
    }

    fn handler(&self, node_type: &NodeType) -> Result<&dyn NodeHandler> {
        let handler: &dyn NodeHandler = match node_type {
            NodeType::Known(NodeKind::UserQuery) => &self.user_query,
            NodeType::Known(NodeKind::KnowledgeBase) => &self.knowledge_base,
            NodeType::Known(NodeKind::LlmEngine) => &self.llm_engine,
            NodeType::Known(NodeKind::WebSearch) => &self.web_search,
            NodeType::Known(NodeKind::Output) => &self.output,
            NodeType::Unknown(_) => {
                let name = node_type.to_string();
                return Err(WorkflowError::UnknownNodeType(name).into());
            }
        };
        Ok(handler)
    }

    /// Execute a single node against the current context
    pub async fn dispatch(&self, node: &Node, context: &ExecutionContext) -> Result<NodeResult> {
        log::info!("Executing node: {} ({})", node.id, node.node_type);
        let handler = self.handler(&node.node_type).map_err(|e| {
            log::error!("Error executing node {}: {}", node.id, e);
            e
        })?;
        handler.execute(node, context).await
    }
}
