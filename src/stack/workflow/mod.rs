// SPDX-License-Identifier: MIT

pub mod context;
pub mod dispatcher;
pub mod executor;
pub mod graph;
pub mod loader;
pub mod nodes;
pub mod result;
pub mod types;
pub mod validator;

pub use context::ExecutionContext;
pub use executor::{
    EngineOptions, ExecutionEvent, ExecutionResult, ExecutionSummary, WorkflowEngine,
};
pub use loader::WorkflowLoader;
pub use result::NodeResult;
pub use types::{Edge, Node, NodeKind, WorkflowConfig};
pub use validator::ValidationResult;
