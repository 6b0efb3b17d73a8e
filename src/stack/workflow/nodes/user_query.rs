// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use chrono::Utc;

use super::NodeHandler;
use crate::adk::error::Result;
use crate::stack::workflow::context::ExecutionContext;
use crate::stack::workflow::result::NodeResult;
use crate::stack::workflow::types::Node;

/// Projects the run's user input into the graph
pub struct UserQueryNode;

#[async_trait]
impl NodeHandler for UserQueryNode {
    async fn execute(&self, _node: &Node, context: &ExecutionContext) -> Result<NodeResult> {
        Ok(NodeResult::UserQuery {
            content: context.user_input.clone(),
            timestamp: Utc::now(),
        })
    }
}
