use anyhow::Result;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::metrics::record_chat_request;
use super::{log_requests, state::*, ServerConfig};
use crate::agent::orchestrator::{FAILURE_ANSWER, REFUSAL_ANSWER};

#[derive(Serialize)]
struct LivenessStats {
    #[serde(rename = "Hello")]
    hello: String,
    uptime: String,
    hash: String,
    phase: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct ChatRequestBody {
    pub prompt: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatResponseBody {
    pub answer: String,
}

/// Liveness probe. Depends on nothing but the process being up.
async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = LivenessStats {
        hello: "World".to_string(),
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        phase: state.gateway.phase().to_string(),
    };
    Json(stats)
}

async fn chat(
    State(gateway): State<SharedGateway>,
    body: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return error_response(StatusCode::BAD_REQUEST, "prompt is required");
    };

    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "prompt must not be empty");
    }

    let Some(orchestrator) = gateway.orchestrator() else {
        warn!(phase = %gateway.phase(), "Chat request while gateway not ready");
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "gateway is not ready");
    };

    let start = Instant::now();
    let answer = orchestrator.handle(prompt).await;

    let outcome = match answer.as_str() {
        REFUSAL_ANSWER => "refused",
        FAILURE_ANSWER => "failed",
        _ => "answered",
    };
    record_chat_request(outcome, start.elapsed());

    Json(ChatResponseBody { answer }).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

pub fn make_app(state: ServerState) -> Router {
    let mut app: Router = Router::new()
        .route("/", get(home))
        .route("/chat", post(chat))
        .with_state(state.clone());

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(super::slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state, log_requests));

    app
}

/// Serve the gateway API until `shutdown` resolves.
pub async fn run_server(
    config: ServerConfig,
    state: ServerState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = make_app(state);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    info!(host = %config.host, port = config.port, "Gateway API listening");

    Ok(axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?)
}
