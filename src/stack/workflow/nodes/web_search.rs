// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use super::NodeHandler;
use crate::adk::error::Result;
use crate::stack::workflow::context::ExecutionContext;
use crate::stack::workflow::result::NodeResult;
use crate::stack::workflow::types::Node;

pub const WEB_SEARCH_PLACEHOLDER: &str = "Web search integration coming soon";

/// Web search placeholder: always answers with an empty result set
pub struct WebSearchNode;

#[async_trait]
impl NodeHandler for WebSearchNode {
    async fn execute(&self, node: &Node, context: &ExecutionContext) -> Result<NodeResult> {
        log::debug!(
            "Web search node {} has no provider; returning placeholder",
            node.id
        );
        Ok(NodeResult::WebSearch {
            results: Vec::new(),
            query: context.user_input.clone(),
            message: WEB_SEARCH_PLACEHOLDER.to_string(),
        })
    }
}
