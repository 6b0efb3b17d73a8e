// SPDX-License-Identifier: MIT

//! Text completion collaborator
//!
//! `Completion` is the narrow contract the workflow engine consumes for text
//! generation. `LlmService` implements it on top of the [`Model`] clients.

use crate::adk::error::{ModelError, Result};
use crate::adk::model::gemini::GeminiModel;
use crate::adk::model::openai::{OpenAIModel, DEFAULT_BASE_URL};
use crate::adk::model::{Content, GenerationConfig, Model};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Completion provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAI,
    Gemini,
}

impl Provider {
    /// Pick the provider whose marker appears in the model name, OpenAI otherwise
    pub fn from_model_name(model: &str) -> Self {
        if model.to_lowercase().contains("gemini") {
            Provider::Gemini
        } else {
            Provider::OpenAI
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub provider: Provider,
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    pub api_key: Option<String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            provider: Provider::default(),
            model: None,
            temperature: 0.7,
            max_tokens: 1000,
            system_prompt: None,
            api_key: None,
        }
    }

    /// Conversation history sent to the model
    fn history(&self) -> Vec<Content> {
        let mut history = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            history.push(Content::text("system", system.clone()));
        }
        history.push(Content::text("user", self.prompt.clone()));
        history
    }
}

/// Text generation contract consumed by the workflow engine
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Completion service backed by the OpenAI and Gemini HTTP APIs.
///
/// A key supplied with the request takes precedence over the configured one.
pub struct LlmService {
    client: Client,
    openai_api_key: Option<String>,
    openai_base_url: String,
    gemini_api_key: Option<String>,
}

impl LlmService {
    pub fn new(openai_api_key: Option<String>, gemini_api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            openai_api_key,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            gemini_api_key,
        }
    }

    /// Override the OpenAI endpoint (proxies, compatible servers)
    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = base_url.into();
        self
    }

    fn resolve_key(&self, request: &CompletionRequest) -> Result<String> {
        let configured = match request.provider {
            Provider::OpenAI => self.openai_api_key.as_ref(),
            Provider::Gemini => self.gemini_api_key.as_ref(),
        };
        request
            .api_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .or(configured)
            .cloned()
            .ok_or_else(|| ModelError::ApiKeyMissing(request.provider.to_string()).into())
    }

    /// Instantiate the model client for a request
    fn model_for(&self, request: &CompletionRequest) -> Result<Arc<dyn Model>> {
        let api_key = self.resolve_key(request)?;
        let model: Arc<dyn Model> = match request.provider {
            Provider::OpenAI => {
                let name = request
                    .model
                    .clone()
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
                Arc::new(OpenAIModel::new(
                    self.client.clone(),
                    name,
                    api_key,
                    self.openai_base_url.clone(),
                ))
            }
            Provider::Gemini => {
                let name = request
                    .model
                    .clone()
                    .filter(|m| m.to_lowercase().contains("gemini"))
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
                Arc::new(GeminiModel::new(self.client.clone(), name, api_key))
            }
        };
        Ok(model)
    }
}

#[async_trait]
impl Completion for LlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        log::info!(
            "Generating completion with provider '{}' (model: {:?})",
            request.provider,
            request.model
        );

        let model = self.model_for(&request)?;
        let config = GenerationConfig {
            temperature: Some(request.temperature),
            max_output_tokens: Some(request.max_tokens),
        };

        let response = model
            .generate_content(&request.history(), Some(&config))
            .await
            .map_err(|e| {
                log::error!("Error generating completion: {}", e);
                e
            })?;

        Ok(response.text_output())
    }
}
