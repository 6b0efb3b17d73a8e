// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use chrono::Utc;

use super::NodeHandler;
use crate::adk::error::Result;
use crate::stack::workflow::context::ExecutionContext;
use crate::stack::workflow::result::{NodeResult, ResultKind};
use crate::stack::workflow::types::Node;

pub const NO_OUTPUT_PLACEHOLDER: &str = "No output generated";

/// Collects every LLM response committed so far into the final answer
pub struct OutputNode;

#[async_trait]
impl NodeHandler for OutputNode {
    async fn execute(&self, _node: &Node, context: &ExecutionContext) -> Result<NodeResult> {
        let responses: Vec<&str> = context
            .results_of_type(ResultKind::LlmResponse)
            .filter_map(|r| r.content())
            .collect();

        let content = if responses.is_empty() {
            NO_OUTPUT_PLACEHOLDER.to_string()
        } else {
            responses.join("\n\n")
        };

        Ok(NodeResult::Output {
            content,
            timestamp: Utc::now(),
        })
    }
}
