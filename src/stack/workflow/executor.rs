// SPDX-License-Identifier: MIT

//! Workflow executor
//!
//! Runs a validated workflow wave by wave: every node whose dependencies
//! have executed starts in the same wave, the wave is joined, and only then
//! are its results committed to the context. A failing node is recorded as
//! an error result and never stops its siblings or later waves.

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::context::ExecutionContext;
use super::dispatcher::NodeDispatcher;
use super::graph::ExecutionGraph;
use super::result::NodeResult;
use super::types::{NodeKind, WorkflowConfig};
use super::validator::{self, ValidationResult};
use crate::adk::completion::Completion;
use crate::adk::error::{Result, WorkflowError};
use crate::adk::retrieval::Retrieval;

/// Engine behaviour switches
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Fail with `StalledGraph` when nodes remain that can never become ready.
    /// Off by default: stranded nodes are simply left out of the results.
    pub strict_stall: bool,
}

/// Counts reported alongside the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
    pub total_nodes: usize,
    pub executed_nodes: usize,
    pub errors: usize,
}

/// Everything a caller gets back from a run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Results of the output nodes, in declaration order
    pub output: Vec<NodeResult>,
    pub context: ExecutionContext,
    pub execution_summary: ExecutionSummary,
}

/// Progress notifications emitted during a run
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    WaveStarted { wave: usize, nodes: Vec<String> },
    NodeCompleted { node_id: String, result: NodeResult },
    NodeFailed { node_id: String, error: String },
    Stalled { pending: Vec<String> },
    Finished { summary: ExecutionSummary },
}

/// Validates and executes workflow definitions
pub struct WorkflowEngine {
    dispatcher: NodeDispatcher,
    options: EngineOptions,
}

impl WorkflowEngine {
    /// Create an engine bound to the given collaborators
    pub fn new(completion: Arc<dyn Completion>, retrieval: Arc<dyn Retrieval>) -> Self {
        Self {
            dispatcher: NodeDispatcher::new(completion, retrieval),
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate_workflow(&self, config: &WorkflowConfig) -> ValidationResult {
        validator::validate(config)
    }

    /// Execute a workflow with the given user input
    pub async fn execute(
        &self,
        config: &WorkflowConfig,
        user_input: impl Into<String>,
        session_id: Option<String>,
    ) -> Result<ExecutionResult> {
        self.execute_with_events(config, user_input, session_id, None)
            .await
    }

    /// Execute a workflow, reporting progress on `events` if given.
    ///
    /// Events are sent without waiting for capacity. When the channel is
    /// full the event is dropped with a warning, so a receiver that only
    /// drains after the run sees a truncated stream. A dropped receiver
    /// does not affect the run either.
    pub async fn execute_with_events(
        &self,
        config: &WorkflowConfig,
        user_input: impl Into<String>,
        session_id: Option<String>,
        events: Option<mpsc::Sender<ExecutionEvent>>,
    ) -> Result<ExecutionResult> {
        let validation = self.validate_workflow(config);
        if !validation.valid {
            log::warn!(
                "Rejecting workflow {:?}: {:?}",
                config.id,
                validation.errors
            );
            return Err(WorkflowError::InvalidWorkflow(validation.errors).into());
        }
        for warning in &validation.warnings {
            log::warn!("{}", warning);
        }

        let graph = ExecutionGraph::build(&config.nodes, &config.edges);
        let mut context = ExecutionContext::new(user_input, session_id, config.id.clone());
        let mut executed: HashSet<String> = HashSet::new();
        let mut wave = 0;

        loop {
            let ready = graph.ready_nodes(&config.nodes, &executed);
            if ready.is_empty() {
                break;
            }

            wave += 1;
            let ids: Vec<String> = ready.iter().map(|n| n.id.clone()).collect();
            log::info!(
                "Workflow wave {}: executing {} nodes: {:?}",
                wave,
                ready.len(),
                ids
            );
            emit(&events, ExecutionEvent::WaveStarted { wave, nodes: ids });

            // Every handler sees the context as of the previous wave
            let outcomes = join_all(
                ready
                    .iter()
                    .map(|node| self.dispatcher.dispatch(node, &context)),
            )
            .await;

            for (node, outcome) in ready.into_iter().zip(outcomes) {
                let result = match outcome {
                    Ok(result) => {
                        log::info!("Node {} completed", node.id);
                        emit(
                            &events,
                            ExecutionEvent::NodeCompleted {
                                node_id: node.id.clone(),
                                result: result.clone(),
                            },
                        );
                        result
                    }
                    Err(e) => {
                        log::error!("Error executing node {}: {}", node.id, e);
                        emit(
                            &events,
                            ExecutionEvent::NodeFailed {
                                node_id: node.id.clone(),
                                error: e.to_string(),
                            },
                        );
                        NodeResult::error(e.to_string())
                    }
                };
                context.commit(node.id.clone(), result);
                executed.insert(node.id.clone());
            }
        }

        let pending: Vec<String> = config
            .nodes
            .iter()
            .filter(|n| !executed.contains(&n.id))
            .map(|n| n.id.clone())
            .collect();
        if !pending.is_empty() {
            log::warn!(
                "Workflow stalled after {} waves; never executed: {:?}",
                wave,
                pending
            );
            emit(
                &events,
                ExecutionEvent::Stalled {
                    pending: pending.clone(),
                },
            );
            if self.options.strict_stall {
                return Err(WorkflowError::StalledGraph(pending).into());
            }
        }

        let output: Vec<NodeResult> = config
            .nodes
            .iter()
            .filter(|n| n.node_type.is(NodeKind::Output))
            .filter_map(|n| context.results.get(&n.id).cloned())
            .collect();

        context.finish();

        let execution_summary = ExecutionSummary {
            total_nodes: config.nodes.len(),
            executed_nodes: executed.len(),
            errors: context.error_count(),
        };
        log::info!("Workflow finished: {:?}", execution_summary);
        emit(
            &events,
            ExecutionEvent::Finished {
                summary: execution_summary.clone(),
            },
        );

        Ok(ExecutionResult {
            output,
            context,
            execution_summary,
        })
    }
}

fn emit(events: &Option<mpsc::Sender<ExecutionEvent>>, event: ExecutionEvent) {
    let Some(tx) = events else {
        return;
    };
    match tx.try_send(event) {
        Ok(()) | Err(TrySendError::Closed(_)) => {}
        Err(TrySendError::Full(event)) => {
            log::warn!("Event channel full, dropping {:?}", event);
        }
    }
}
