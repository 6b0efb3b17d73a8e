// SPDX-License-Identifier: MIT

//! Typed error handling for genai-stack
//!
//! Collaborators and the workflow engine share one error hierarchy built
//! with thiserror. Node-level failures are converted into error results by
//! the executor and never reach the caller as `Err`.

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, StackError>;

/// Top-level error type for genai-stack
#[derive(Debug, Error)]
pub enum StackError {
    /// API errors from external services (OpenAI, Gemini, Chroma)
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// Configuration errors (invalid env vars, bad settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workflow-specific errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Model/LLM-specific errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Retrieval collaborator errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Workflow-specific errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Validation failed before execution started
    #[error("Invalid workflow: {}", .0.join("; "))]
    InvalidWorkflow(Vec<String>),

    /// Node type could not be resolved to a known kind
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// No node became ready while some nodes were still pending
    #[error("Workflow stalled with unexecuted nodes: {0:?}")]
    StalledGraph(Vec<String>),

    /// File not found when loading workflow
    #[error("Workflow file not found: {0}")]
    FileNotFound(String),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key neither configured nor supplied with the request
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Provider name not recognised
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),
}

impl StackError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a retrieval error
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval(message.into())
    }

    /// Create from a generic message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Validation errors carried by this error, if it is an invalid-workflow failure
    pub fn validation_errors(&self) -> Option<&[String]> {
        match self {
            Self::Workflow(WorkflowError::InvalidWorkflow(errors)) => Some(errors),
            _ => None,
        }
    }
}

impl From<&str> for StackError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for StackError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}
