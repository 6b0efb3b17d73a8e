// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::{ModelError, Result, StackError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
}

impl GeminiModel {
    /// Create a new GeminiModel with an explicit key
    pub fn new(client: Client, model_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model_name: model_name.into(),
        }
    }

    /// Build the generateContent request body.
    ///
    /// System messages are lifted into `systemInstruction`; Gemini only
    /// accepts `user` and `model` roles inside `contents`.
    fn build_request_body(
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> serde_json::Value {
        let system_parts: Vec<serde_json::Value> = history
            .iter()
            .filter(|c| c.role == "system")
            .flat_map(|c| c.parts.iter().filter_map(part_to_gemini_json))
            .collect();

        let contents: Vec<serde_json::Value> = history
            .iter()
            .filter(|c| c.role != "system")
            .map(|c| {
                let parts: Vec<serde_json::Value> =
                    c.parts.iter().filter_map(part_to_gemini_json).collect();
                json!({ "role": c.role, "parts": parts })
            })
            .collect();

        let mut body = json!({
            "contents": contents
        });

        if !system_parts.is_empty() {
            body["systemInstruction"] = json!({ "parts": system_parts });
        }

        if let Some(cfg) = config {
            let mut generation = serde_json::Map::new();
            if let Some(temp) = cfg.temperature {
                generation.insert("temperature".to_string(), json!(temp));
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                generation.insert("maxOutputTokens".to_string(), json!(max_tokens));
            }
            if !generation.is_empty() {
                body["generationConfig"] = serde_json::Value::Object(generation);
            }
        }

        body
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model_name, self.api_key
        );

        let body = Self::build_request_body(history, config);

        log::debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self.client.post(&url).json(&body).send().await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            return Err(StackError::api("gemini", text));
        }

        let resp_json: serde_json::Value = resp.json().await?;
        log::debug!("Gemini response: {}", resp_json);

        let candidate = resp_json["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("No candidates in response".into()))?;

        if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
            log::debug!("Gemini finish reason: {}", finish_reason);
            if finish_reason == "SAFETY" {
                return Err(ModelError::InvalidResponse(
                    "Gemini blocked response due to safety filters.".into(),
                )
                .into());
            }
        }

        let parts_json = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| {
                log::error!(
                    "No content parts in candidate. Full response: {}",
                    resp_json
                );
                ModelError::InvalidResponse(format!("No content in Gemini response: {}", candidate))
            })?;

        let parts = parts_json.iter().flat_map(parse_gemini_part).collect();

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }
}

/// Serialize a Part to Gemini API JSON format
/// Returns None for parts that shouldn't be sent (e.g., Thinking)
pub fn part_to_gemini_json(part: &Part) -> Option<serde_json::Value> {
    match part {
        Part::Text(t) => Some(json!({ "text": t })),
        Part::Thinking(_) => None,
    }
}

/// Parse a Gemini API JSON part into Parts
pub fn parse_gemini_part(p: &serde_json::Value) -> Vec<Part> {
    let mut parts = Vec::new();

    if let Some(thought) = p.get("thought").and_then(|t| t.as_str()) {
        if !thought.is_empty() {
            parts.push(Part::Thinking(thought.to_string()));
        }
    }

    if let Some(text) = p["text"].as_str() {
        parts.push(Part::Text(text.to_string()));
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_text_part() {
        let part = Part::Text("Hello world".to_string());
        let json = part_to_gemini_json(&part).unwrap();
        assert_eq!(json, json!({ "text": "Hello world" }));
    }

    #[test]
    fn test_serialize_thinking_part_returns_none() {
        let part = Part::Thinking("Internal reasoning".to_string());
        assert!(part_to_gemini_json(&part).is_none());
    }

    #[test]
    fn test_parse_thinking_part() {
        let json = json!({ "thought": "Let me think about this..." });
        let parts = parse_gemini_part(&json);

        assert_eq!(parts.len(), 1);
        match &parts[0] {
            Part::Thinking(t) => assert_eq!(t, "Let me think about this..."),
            _ => panic!("Expected Thinking part"),
        }
    }

    #[test]
    fn test_parse_empty_thought_ignored() {
        let json = json!({ "thought": "", "text": "Hello" });
        let parts = parse_gemini_part(&json);

        assert_eq!(parts.len(), 1);
        match &parts[0] {
            Part::Text(t) => assert_eq!(t, "Hello"),
            _ => panic!("Expected Text part"),
        }
    }

    #[test]
    fn test_system_message_becomes_system_instruction() {
        let history = [
            Content::text("system", "Be brief"),
            Content::text("user", "What is Rust?"),
        ];
        let body = GeminiModel::build_request_body(&history, None);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_generation_config_mapping() {
        let history = [Content::text("user", "hi")];
        let config = GenerationConfig {
            temperature: Some(0.2),
            max_output_tokens: Some(256),
        };
        let body = GeminiModel::build_request_body(&history, Some(&config));

        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
        let generation = body["generationConfig"].as_object().unwrap();
        assert_eq!(generation.len(), 2);
        assert!(body.get("systemInstruction").is_none());
    }
}
