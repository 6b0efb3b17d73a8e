// SPDX-License-Identifier: MIT

//! Workflow loader - JSON and YAML file loading and parsing

use std::fs;
use std::path::Path;

use super::types::WorkflowConfig;
use crate::adk::error::{Result, WorkflowError};

/// Loads workflow definitions from disk
pub struct WorkflowLoader;

impl WorkflowLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a workflow definition from a `.json`, `.yaml` or `.yml` file.
    ///
    /// Anything that is not `.json` is parsed as YAML.
    pub fn load_workflow<P: AsRef<Path>>(&self, path: P) -> Result<WorkflowConfig> {
        let path = path.as_ref();
        if !path.exists() {
            let missing = path.display().to_string();
            return Err(WorkflowError::FileNotFound(missing).into());
        }

        let content = fs::read_to_string(path)?;
        log::debug!("Loaded workflow file {}", path.display());

        if path.extension().is_some_and(|ext| ext == "json") {
            Self::parse_json(&content)
        } else {
            Self::parse_yaml(&content)
        }
    }

    pub fn parse_json(content: &str) -> Result<WorkflowConfig> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn parse_yaml(content: &str) -> Result<WorkflowConfig> {
        Ok(serde_yaml::from_str(content)?)
    }
}

impl Default for WorkflowLoader {
    fn default() -> Self {
        Self::new()
    }
}
