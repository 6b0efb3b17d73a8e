// SPDX-License-Identifier: MIT

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::adk::error::StackError;
use crate::stack::workflow::executor::{ExecutionEvent, WorkflowEngine};
use crate::stack::workflow::types::WorkflowConfig;
use crate::stack::workflow::validator::ValidationResult;

type SharedEngine = Arc<WorkflowEngine>;

pub fn router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/workflows/validate", post(validate_workflow))
        .route("/api/workflows/execute", post(execute_workflow))
        .route("/api/workflows/execute/stream", post(stream_execution))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

pub async fn serve(port: u16, engine: WorkflowEngine) -> std::io::Result<()> {
    let app = router(Arc::new(engine));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn validate_workflow(
    State(engine): State<SharedEngine>,
    Json(config): Json<WorkflowConfig>,
) -> Json<ValidationResult> {
    Json(engine.validate_workflow(&config))
}

#[derive(Deserialize)]
struct ExecutionRequest {
    workflow: WorkflowConfig,
    user_input: String,
    #[serde(default)]
    session_id: Option<String>,
}

impl ExecutionRequest {
    fn session_id(&self) -> String {
        self.session_id
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

async fn execute_workflow(
    State(engine): State<SharedEngine>,
    Json(payload): Json<ExecutionRequest>,
) -> Response {
    let session_id = payload.session_id();
    log::info!(
        "Executing workflow {:?} (session {})",
        payload.workflow.id,
        session_id
    );

    match engine
        .execute(&payload.workflow, payload.user_input, Some(session_id))
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

fn error_response(err: &StackError) -> (StatusCode, Json<Value>) {
    match err.validation_errors() {
        Some(errors) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string(), "errors": errors })),
        ),
        None => {
            log::error!("Workflow execution failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
        }
    }
}

fn event_name(event: &ExecutionEvent) -> &'static str {
    match event {
        ExecutionEvent::WaveStarted { .. } => "wave_started",
        ExecutionEvent::NodeCompleted { .. } => "node_completed",
        ExecutionEvent::NodeFailed { .. } => "node_failed",
        ExecutionEvent::Stalled { .. } => "stalled",
        ExecutionEvent::Finished { .. } => "finished",
    }
}

fn sse_event<T: serde::Serialize>(name: &str, data: &T) -> Option<Event> {
    match Event::default().event(name).json_data(data) {
        Ok(event) => Some(event),
        Err(e) => {
            log::error!("Failed to encode {} event: {}", name, e);
            None
        }
    }
}

async fn stream_execution(
    State(engine): State<SharedEngine>,
    Json(payload): Json<ExecutionRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(100);

    tokio::spawn(async move {
        let session_id = payload.session_id();
        log::info!(
            "Starting streaming execution for workflow {:?} (session {})",
            payload.workflow.id,
            session_id
        );

        let (event_tx, mut event_rx) = mpsc::channel::<ExecutionEvent>(100);
        let run = engine.execute_with_events(
            &payload.workflow,
            payload.user_input,
            Some(session_id),
            Some(event_tx),
        );
        let forward = async {
            while let Some(event) = event_rx.recv().await {
                if let Some(sse) = sse_event(event_name(&event), &event) {
                    let _ = tx.send(Ok(sse)).await;
                }
            }
        };

        let (outcome, _) = tokio::join!(run, forward);

        let last = match outcome {
            Ok(result) => sse_event("result", &result),
            Err(e) => {
                let (_, Json(body)) = error_response(&e);
                sse_event("error", &body)
            }
        };
        if let Some(event) = last {
            let _ = tx.send(Ok(event)).await;
        }
        log::info!("Streaming execution finished");
    });

    let keep_alive = KeepAlive::new().interval(Duration::from_secs(1));
    Sse::new(ReceiverStream::new(rx)).keep_alive(keep_alive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::WorkflowError;

    #[test]
    fn test_invalid_workflow_maps_to_bad_request() {
        let errors = vec!["Invalid edge source: x".to_string()];
        let err: StackError = WorkflowError::InvalidWorkflow(errors).into();
        let (status, Json(body)) = error_response(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"], json!(["Invalid edge source: x"]));
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("Invalid edge source: x"));
    }

    #[test]
    fn test_other_errors_map_to_internal_error() {
        let err = StackError::other("boom");
        let (status, Json(body)) = error_response(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "boom" }));
    }

    #[test]
    fn test_session_id_generated_when_missing() {
        let request: ExecutionRequest = serde_json::from_value(json!({
            "workflow": { "nodes": [], "edges": [] },
            "user_input": "hi"
        }))
        .unwrap();
        let generated = request.session_id();
        assert!(Uuid::parse_str(&generated).is_ok());

        let request: ExecutionRequest = serde_json::from_value(json!({
            "workflow": { "nodes": [], "edges": [] },
            "user_input": "hi",
            "session_id": "abc"
        }))
        .unwrap();
        assert_eq!(request.session_id(), "abc");
    }

    #[test]
    fn test_event_names_match_serialized_tag() {
        let events = vec![
            ExecutionEvent::WaveStarted {
                wave: 1,
                nodes: vec![],
            },
            ExecutionEvent::NodeFailed {
                node_id: "n".to_string(),
                error: "e".to_string(),
            },
            ExecutionEvent::Stalled { pending: vec![] },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["event"], event_name(&event));
        }
    }
}
