// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::NodeHandler;
use crate::adk::completion::{Completion, CompletionRequest, Provider};
use crate::adk::error::Result;
use crate::stack::workflow::context::ExecutionContext;
use crate::stack::workflow::result::{NodeResult, ResultKind};
use crate::stack::workflow::types::Node;

/// Number of retrieved documents spliced into the prompt
const MAX_CONTEXT_DOCUMENTS: usize = 3;

/// Settings of an LLM node
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LlmEngineConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Prompt template; `{query}` is replaced by the assembled prompt
    #[serde(default)]
    pub prompt: Option<String>,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

impl LlmEngineConfig {
    pub fn from_node(node: &Node) -> Result<Self> {
        let config = Value::Object(node.config().clone());
        Ok(serde_json::from_value(config)?)
    }

    fn provider(&self) -> Provider {
        self.model
            .as_deref()
            .map(Provider::from_model_name)
            .unwrap_or_default()
    }
}

/// Assemble the prompt for an LLM node.
///
/// Documents come from the first knowledge-base result committed to the
/// context, whether or not that node is wired to this one.
pub fn build_prompt(config: &LlmEngineConfig, context: &ExecutionContext) -> String {
    let mut prompt = context.user_input.clone();

    if let Some(NodeResult::KnowledgeBase { documents, .. }) =
        context.first_result_of_type(ResultKind::KnowledgeBase)
    {
        if !documents.is_empty() {
            let take = documents.len().min(MAX_CONTEXT_DOCUMENTS);
            let context_docs = documents[..take].join("\n\n");
            prompt = format!("Context:\n{}\n\nQuestion: {}", context_docs, prompt);
        }
    }

    if let Some(template) = config.prompt.as_deref().filter(|t| !t.is_empty()) {
        prompt = template.replace("{query}", &prompt);
    }

    prompt
}

/// Generates a response through the completion collaborator
pub struct LlmEngineNode {
    completion: Arc<dyn Completion>,
}

impl LlmEngineNode {
    pub fn new(completion: Arc<dyn Completion>) -> Self {
        Self { completion }
    }
}

#[async_trait]
impl NodeHandler for LlmEngineNode {
    async fn execute(&self, node: &Node, context: &ExecutionContext) -> Result<NodeResult> {
        let config = LlmEngineConfig::from_node(node)?;
        let provider = config.provider();

        let request = CompletionRequest {
            prompt: build_prompt(&config, context),
            provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone().filter(|s| !s.is_empty()),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        };

        log::info!(
            "LLM node {} calling provider '{}' (prompt length: {})",
            node.id,
            provider,
            request.prompt.len()
        );

        let content = self.completion.complete(request).await?;

        Ok(NodeResult::LlmResponse {
            content,
            model: config.model,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::workflow::types::NodeKind;
    use serde_json::json;
    use std::sync::Mutex;

    struct CapturingCompletion {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl CapturingCompletion {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Completion for CapturingCompletion {
        async fn complete(&self, request: CompletionRequest) -> Result<String> {
            let reply = format!("reply to {}", request.prompt);
            self.requests.lock().unwrap().push(request);
            Ok(reply)
        }
    }

    fn kb(documents: &[&str]) -> NodeResult {
        NodeResult::KnowledgeBase {
            documents: documents.iter().map(|d| d.to_string()).collect(),
            relevance_scores: vec![],
            metadata: vec![],
        }
    }

    fn config(value: Value) -> LlmEngineConfig {
        let node = Node::new("l", NodeKind::LlmEngine).with_config(value);
        LlmEngineConfig::from_node(&node).unwrap()
    }

    #[test]
    fn test_prompt_is_user_input_by_default() {
        let ctx = ExecutionContext::new("hello", None, None);
        assert_eq!(build_prompt(&config(json!({})), &ctx), "hello");
    }

    #[test]
    fn test_prompt_includes_first_three_documents() {
        let mut ctx = ExecutionContext::new("why?", None, None);
        ctx.commit("kb1", kb(&["a", "b", "c", "d"]));
        ctx.commit("kb2", kb(&["other"]));

        assert_eq!(
            build_prompt(&config(json!({})), &ctx),
            "Context:\na\n\nb\n\nc\n\nQuestion: why?"
        );
    }

    #[test]
    fn test_empty_knowledge_base_leaves_prompt() {
        let mut ctx = ExecutionContext::new("why?", None, None);
        ctx.commit("kb", kb(&[]));
        assert_eq!(build_prompt(&config(json!({})), &ctx), "why?");
    }

    #[test]
    fn test_template_wraps_assembled_prompt() {
        let mut ctx = ExecutionContext::new("why?", None, None);
        ctx.commit("kb", kb(&["doc"]));

        let cfg = config(json!({ "prompt": "Answer politely.\n{query}" }));
        assert_eq!(
            build_prompt(&cfg, &ctx),
            "Answer politely.\nContext:\ndoc\n\nQuestion: why?"
        );
    }

    #[test]
    fn test_config_defaults() {
        let cfg = config(json!({}));
        assert_eq!(cfg.temperature, 0.7);
        assert_eq!(cfg.max_tokens, 1000);
        assert_eq!(cfg.provider(), Provider::OpenAI);
    }

    #[tokio::test]
    async fn test_request_carries_node_settings() {
        let completion = CapturingCompletion::new();
        let handler = LlmEngineNode::new(completion.clone());
        let node = Node::new("l", NodeKind::LlmEngine).with_config(json!({
            "model": "gemini-1.5-pro",
            "temperature": 0.2,
            "maxTokens": 64,
            "systemPrompt": "Be brief",
            "apiKey": "key-123"
        }));
        let ctx = ExecutionContext::new("hello", None, None);

        let result = handler.execute(&node, &ctx).await.unwrap();

        let requests = completion.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.provider, Provider::Gemini);
        assert_eq!(request.model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(request.temperature, 0.2);
        assert_eq!(request.max_tokens, 64);
        assert_eq!(request.system_prompt.as_deref(), Some("Be brief"));
        assert_eq!(request.api_key.as_deref(), Some("key-123"));

        match result {
            NodeResult::LlmResponse { content, model, .. } => {
                assert_eq!(content, "reply to hello");
                assert_eq!(model.as_deref(), Some("gemini-1.5-pro"));
            }
            other => panic!("Expected LlmResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_optional_strings_dropped() {
        let completion = CapturingCompletion::new();
        let handler = LlmEngineNode::new(completion.clone());
        let node = Node::new("l", NodeKind::LlmEngine)
            .with_config(json!({ "systemPrompt": "", "apiKey": "" }));
        let ctx = ExecutionContext::new("hello", None, None);

        handler.execute(&node, &ctx).await.unwrap();

        let requests = completion.requests.lock().unwrap();
        assert!(requests[0].system_prompt.is_none());
        assert!(requests[0].api_key.is_none());
    }
}
