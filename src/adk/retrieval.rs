// SPDX-License-Identifier: MIT

//! Similarity retrieval collaborator
//!
//! `Retrieval` is the contract consumed by knowledge-base nodes.
//! `ChromaRetrieval` implements it against a Chroma server over HTTP.

use crate::adk::embedding::Embedder;
use crate::adk::error::{Result, StackError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Matches returned by a similarity search, aligned by index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub distances: Vec<f32>,
    pub metadatas: Vec<Map<String, Value>>,
}

/// Similarity search contract consumed by the workflow engine
#[async_trait]
pub trait Retrieval: Send + Sync {
    async fn search_by_text(
        &self,
        query_text: &str,
        provider: &str,
        n_results: usize,
        filter: Option<&Value>,
    ) -> Result<SearchResults>;
}

/// Retrieval over a Chroma collection
pub struct ChromaRetrieval {
    client: Client,
    base_url: String,
    collection_name: String,
    embedder: Arc<dyn Embedder>,
    collection_id: OnceCell<String>,
}

impl ChromaRetrieval {
    pub fn new(
        host: &str,
        port: u16,
        collection_name: impl Into<String>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("http://{}:{}", host, port),
            collection_name: collection_name.into(),
            embedder,
            collection_id: OnceCell::new(),
        }
    }

    /// Resolve the collection id, creating the collection on first use
    async fn collection_id(&self) -> Result<&str> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let resp = self
                    .client
                    .post(format!("{}/api/v1/collections", self.base_url))
                    .json(&json!({
                        "name": self.collection_name,
                        "get_or_create": true,
                        "metadata": { "description": "genai-stack document embeddings" }
                    }))
                    .send()
                    .await?;

                if !resp.status().is_success() {
                    let text = resp.text().await?;
                    return Err(StackError::api("chroma", text));
                }

                let body: Value = resp.json().await?;
                let id = body["id"]
                    .as_str()
                    .ok_or_else(|| StackError::retrieval("Chroma collection response has no id"))?
                    .to_string();
                log::info!(
                    "Connected to Chroma collection '{}' ({}) at {}",
                    self.collection_name,
                    id,
                    self.base_url
                );
                Ok(id)
            })
            .await?;
        Ok(id.as_str())
    }
}

#[async_trait]
impl Retrieval for ChromaRetrieval {
    async fn search_by_text(
        &self,
        query_text: &str,
        provider: &str,
        n_results: usize,
        filter: Option<&Value>,
    ) -> Result<SearchResults> {
        let embeddings = self
            .embedder
            .embed(&[query_text.to_string()], provider)
            .await?;
        let query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| StackError::retrieval("Embedder returned no vectors"))?;

        let collection_id = self.collection_id().await?;

        let mut body = json!({
            "query_embeddings": [query_embedding],
            "n_results": n_results,
            "include": ["documents", "distances", "metadatas"]
        });
        if let Some(filter) = filter {
            body["where"] = filter.clone();
        }

        let resp = self
            .client
            .post(format!(
                "{}/api/v1/collections/{}/query",
                self.base_url, collection_id
            ))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            log::error!("Error searching vector store: {}", text);
            return Err(StackError::api("chroma", text));
        }

        let body: Value = resp.json().await?;
        Ok(parse_query_response(&body))
    }
}

/// Chroma answers one row per query embedding; only the first row is used
fn parse_query_response(body: &Value) -> SearchResults {
    let first_row = |key: &str| -> Vec<Value> {
        body[key]
            .as_array()
            .and_then(|rows| rows.first())
            .and_then(|row| row.as_array())
            .cloned()
            .unwrap_or_default()
    };

    SearchResults {
        documents: first_row("documents")
            .into_iter()
            .map(|d| d.as_str().unwrap_or_default().to_string())
            .collect(),
        distances: first_row("distances")
            .into_iter()
            .filter_map(|d| d.as_f64())
            .map(|d| d as f32)
            .collect(),
        metadatas: first_row("metadatas")
            .into_iter()
            .map(|m| match m {
                Value::Object(map) => map,
                _ => Map::new(),
            })
            .collect(),
    }
}
