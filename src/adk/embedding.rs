// SPDX-License-Identifier: MIT

//! Embedding generation for retrieval queries

use crate::adk::error::{ModelError, Result, StackError};
use crate::adk::model::openai::DEFAULT_BASE_URL;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_GEMINI_EMBEDDING_MODEL: &str = "models/embedding-001";

/// Turns texts into embedding vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String], provider: &str) -> Result<Vec<Vec<f32>>>;
}

/// Embedding service backed by the OpenAI and Gemini HTTP APIs
pub struct EmbeddingService {
    client: Client,
    openai_api_key: Option<String>,
    openai_base_url: String,
    gemini_api_key: Option<String>,
}

impl EmbeddingService {
    pub fn new(openai_api_key: Option<String>, gemini_api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            openai_api_key,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            gemini_api_key,
        }
    }

    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = base_url.into();
        self
    }

    async fn openai_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ModelError::ApiKeyMissing("openai".to_string()))?;

        let resp = self
            .client
            .post(format!("{}/embeddings", self.openai_base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&json!({
                "model": DEFAULT_OPENAI_EMBEDDING_MODEL,
                "input": texts
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(StackError::api("openai", text));
        }

        let body: serde_json::Value = resp.json().await?;
        parse_openai_embeddings(&body)
    }

    async fn gemini_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .gemini_api_key
            .as_ref()
            .ok_or_else(|| ModelError::ApiKeyMissing("gemini".to_string()))?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/{}:embedContent?key={}",
            DEFAULT_GEMINI_EMBEDDING_MODEL, api_key
        );

        // embedContent takes one text per request
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            let resp = self
                .client
                .post(&url)
                .json(&json!({
                    "model": DEFAULT_GEMINI_EMBEDDING_MODEL,
                    "content": { "parts": [{ "text": text }] },
                    "taskType": "RETRIEVAL_DOCUMENT"
                }))
                .send()
                .await?;

            if !resp.status().is_success() {
                let text = resp.text().await?;
                return Err(StackError::api("gemini", text));
            }

            let body: serde_json::Value = resp.json().await?;
            embeddings.push(parse_vector(&body["embedding"]["values"])?);
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed(&self, texts: &[String], provider: &str) -> Result<Vec<Vec<f32>>> {
        log::debug!(
            "Embedding {} texts with provider '{}'",
            texts.len(),
            provider
        );
        match provider {
            "openai" => self.openai_embeddings(texts).await,
            "gemini" => self.gemini_embeddings(texts).await,
            other => Err(ModelError::UnsupportedProvider(other.to_string()).into()),
        }
    }
}

fn parse_openai_embeddings(body: &serde_json::Value) -> Result<Vec<Vec<f32>>> {
    body["data"]
        .as_array()
        .ok_or_else(|| ModelError::InvalidResponse("No data in embedding response".into()))?
        .iter()
        .map(|item| parse_vector(&item["embedding"]))
        .collect()
}

fn parse_vector(value: &serde_json::Value) -> Result<Vec<f32>> {
    let values = value
        .as_array()
        .ok_or_else(|| ModelError::InvalidResponse("Embedding is not an array".into()))?;
    Ok(values
        .iter()
        .filter_map(|v| v.as_f64())
        .map(|v| v as f32)
        .collect())
}
