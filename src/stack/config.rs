// SPDX-License-Identifier: MIT

//! Environment-driven settings and collaborator wiring

use std::env;
use std::sync::Arc;

use crate::adk::completion::LlmService;
use crate::adk::embedding::EmbeddingService;
use crate::adk::error::{Result, StackError};
use crate::adk::retrieval::ChromaRetrieval;
use crate::stack::workflow::executor::{EngineOptions, WorkflowEngine};

const DEFAULT_CHROMA_HOST: &str = "localhost";
const DEFAULT_CHROMA_PORT: u16 = 8001;
const DEFAULT_COLLECTION_NAME: &str = "genai_stack_docs";

/// Process-wide settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub chroma_host: String,
    pub chroma_port: u16,
    pub chroma_collection_name: String,
    pub strict_stall: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: None,
            gemini_api_key: None,
            chroma_host: DEFAULT_CHROMA_HOST.to_string(),
            chroma_port: DEFAULT_CHROMA_PORT,
            chroma_collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            strict_stall: false,
        }
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let chroma_port = match get("CHROMA_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                StackError::config(format!("CHROMA_PORT must be a port number, got '{}'", raw))
            })?,
            None => defaults.chroma_port,
        };

        let strict_stall = match get("STRICT_STALL") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                StackError::config(format!("STRICT_STALL must be true or false, got '{}'", raw))
            })?,
            None => defaults.strict_stall,
        };

        Ok(Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            gemini_api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            chroma_host: get("CHROMA_HOST").unwrap_or(defaults.chroma_host),
            chroma_port,
            chroma_collection_name: get("CHROMA_COLLECTION_NAME")
                .unwrap_or(defaults.chroma_collection_name),
            strict_stall,
        })
    }

    pub fn llm_service(&self) -> LlmService {
        let service = LlmService::new(self.openai_api_key.clone(), self.gemini_api_key.clone());
        match &self.openai_base_url {
            Some(url) => service.with_openai_base_url(url.clone()),
            None => service,
        }
    }

    pub fn embedding_service(&self) -> EmbeddingService {
        let service =
            EmbeddingService::new(self.openai_api_key.clone(), self.gemini_api_key.clone());
        match &self.openai_base_url {
            Some(url) => service.with_openai_base_url(url.clone()),
            None => service,
        }
    }

    pub fn retrieval(&self) -> ChromaRetrieval {
        ChromaRetrieval::new(
            &self.chroma_host,
            self.chroma_port,
            self.chroma_collection_name.clone(),
            Arc::new(self.embedding_service()),
        )
    }

    /// Engine wired to the real collaborators
    pub fn workflow_engine(&self) -> WorkflowEngine {
        log::info!(
            "Wiring engine: chroma at {}:{} (collection '{}'), strict_stall={}",
            self.chroma_host,
            self.chroma_port,
            self.chroma_collection_name,
            self.strict_stall
        );
        let options = EngineOptions {
            strict_stall: self.strict_stall,
        };
        let completion = Arc::new(self.llm_service());
        let engine = WorkflowEngine::new(completion, Arc::new(self.retrieval()));
        engine.with_options(options)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.chroma_port, 8001);
        assert_eq!(settings.chroma_collection_name, "genai_stack_docs");
    }

    #[test]
    fn test_reads_values() {
        let settings = Settings::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("CHROMA_HOST", "chroma.internal"),
            ("CHROMA_PORT", "9000"),
            ("STRICT_STALL", "TRUE"),
        ]))
        .unwrap();
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.chroma_host, "chroma.internal");
        assert_eq!(settings.chroma_port, 9000);
        assert!(settings.strict_stall);
    }

    #[test]
    fn test_gemini_key_fallback() {
        let settings = Settings::from_lookup(lookup(&[("GOOGLE_API_KEY", "g-key")])).unwrap();
        assert_eq!(settings.gemini_api_key.as_deref(), Some("g-key"));

        let settings = Settings::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "primary"),
            ("GOOGLE_API_KEY", "g-key"),
        ]))
        .unwrap();
        assert_eq!(settings.gemini_api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let vars = lookup(&[("OPENAI_API_KEY", ""), ("CHROMA_PORT", " ")]);
        let settings = Settings::from_lookup(vars).unwrap();
        assert!(settings.openai_api_key.is_none());
        assert_eq!(settings.chroma_port, 8001);
    }

    #[test]
    fn test_invalid_values() {
        let err = Settings::from_lookup(lookup(&[("CHROMA_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, StackError::Config(_)));

        let err = Settings::from_lookup(lookup(&[("STRICT_STALL", "maybe")])).unwrap_err();
        assert!(matches!(err, StackError::Config(_)));
    }
}
