// SPDX-License-Identifier: MIT

//! Node handlers - one per node kind
//!
//! Each handler turns a node and the current run context into a
//! [`NodeResult`]. Handlers only read the context; the executor commits
//! their results once the whole wave has finished.

mod knowledge_base;
mod llm_engine;
mod output;
mod user_query;
mod web_search;

pub use knowledge_base::{KnowledgeBaseConfig, KnowledgeBaseNode};
pub use llm_engine::{build_prompt, LlmEngineConfig, LlmEngineNode};
pub use output::{OutputNode, NO_OUTPUT_PLACEHOLDER};
pub use user_query::UserQueryNode;
pub use web_search::{WebSearchNode, WEB_SEARCH_PLACEHOLDER};

use async_trait::async_trait;

use super::context::ExecutionContext;
use super::result::NodeResult;
use super::types::Node;
use crate::adk::error::Result;

/// Core trait for node kind implementations
#[async_trait]
pub trait NodeHandler: Send + Sync {
    async fn execute(&self, node: &Node, context: &ExecutionContext) -> Result<NodeResult>;
}
