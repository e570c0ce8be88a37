//! HTTP API for gridsync.
//!
//! A single action endpoint fronts the [`CommandRegistry`]: callers POST
//! `{"action": "<name>", ...}` to `/api/v1/actions` and get the handler's
//! JSON body back, with engine errors mapped onto HTTP statuses.

pub mod config;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use gridsync_engine::{CommandRegistry, EngineError, TableSync};
use gridsync_graph::{
    FileCredentialStore, GraphResult, TokenProvider, Transport, WorkbookClient,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub use config::{ConfigError, ServerConfig};

/// Shared per-process state.
pub struct AppState {
    pub sync: TableSync,
    pub commands: CommandRegistry,
}

impl AppState {
    pub fn new(sync: TableSync, commands: CommandRegistry) -> Self {
        Self { sync, commands }
    }

    /// Wires the token provider, transport and workbook client from `config`,
    /// with credentials persisted at `config.credentials_path`.
    pub fn from_config(config: &ServerConfig) -> GraphResult<Self> {
        let store = Arc::new(FileCredentialStore::new(&config.credentials_path));
        let tokens = Arc::new(TokenProvider::new(&config.graph, store)?);
        let transport = Arc::new(Transport::new(&config.graph, tokens)?);
        let workbook = WorkbookClient::new(transport, &config.graph);
        Ok(Self::new(
            TableSync::new(workbook),
            CommandRegistry::with_defaults(),
        ))
    }
}

fn error_body(message: impl Into<String>) -> Value {
    json!({ "success": false, "error": message.into() })
}

/// Maps an engine failure onto a status code and JSON body.
fn error_response(err: &EngineError) -> Response {
    let mut body = error_body(err.to_string());
    let status = match err {
        EngineError::Validation(_) | EngineError::UnknownAction(_) => StatusCode::BAD_REQUEST,
        EngineError::Auth(_) => {
            body["reconnectRequired"] = Value::Bool(true);
            StatusCode::UNAUTHORIZED
        }
        EngineError::Step { step, .. } => {
            body["step"] = json!(step);
            StatusCode::BAD_GATEWAY
        }
        EngineError::Api { .. } | EngineError::Transport(_) => StatusCode::BAD_GATEWAY,
    };
    if let Some(upstream) = err.upstream_status() {
        body["upstreamStatus"] = json!(upstream);
    }
    (status, Json(body)).into_response()
}

async fn run_action(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected malformed request");
            return (StatusCode::BAD_REQUEST, Json(error_body(rejection.body_text())))
                .into_response();
        }
    };

    match state.commands.execute(&state.sync, request).await {
        Ok(output) => {
            let status = if output.success {
                StatusCode::OK
            } else {
                StatusCode::MULTI_STATUS
            };
            (status, Json(output.body)).into_response()
        }
        Err(err) => {
            info!(error = %err, "Action failed");
            error_response(&err)
        }
    }
}

async fn list_actions(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "actions": state.commands.names() }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/actions", get(list_actions).post(run_action))
        .with_state(state)
}
