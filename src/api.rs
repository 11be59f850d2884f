//! HTTP endpoints for driving the engine from a standalone host.
//!
//! These are a thin layer over `GameManager`; chat delivery and overlays are
//! left to whatever sits in front.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::TriviaError;
use crate::protocol::TriviaEvent;
use crate::state::GameManager;
use crate::types::{RoundId, RoundState};
use crate::ws;

/// Shared state for the HTTP and WebSocket handlers
pub struct HostState {
    pub manager: GameManager,
    /// Engine events, fanned out to WebSocket subscribers
    pub events: broadcast::Sender<TriviaEvent>,
}

/// Build the host router
pub fn router(state: Arc<HostState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/round",
            get(get_round).post(create_round).delete(cancel_round),
        )
        .route("/api/chat", post(post_chat))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResponse {
    #[serde(flatten)]
    pub round: RoundState,
    pub time_remaining: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub round_id: RoundId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub accepted: bool,
}

fn error_response(error: &TriviaError) -> Response {
    let status = match error {
        TriviaError::RoundInProgress | TriviaError::NoRoundInProgress(_) => StatusCode::CONFLICT,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.safe_message(),
        }),
    )
        .into_response()
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// GET /api/round
///
/// The active or most recent round, plus seconds left to answer.
pub async fn get_round(State(state): State<Arc<HostState>>) -> Json<RoundResponse> {
    let round = state.manager.round_state().await;
    let time_remaining = state.manager.time_remaining().await;
    Json(RoundResponse {
        round,
        time_remaining,
    })
}

/// POST /api/round
pub async fn create_round(State(state): State<Arc<HostState>>) -> Response {
    match state.manager.create().await {
        Ok(round_id) => (StatusCode::CREATED, Json(CreatedResponse { round_id })).into_response(),
        Err(e) => error_response(&e),
    }
}

/// DELETE /api/round
pub async fn cancel_round(State(state): State<Arc<HostState>>) -> Response {
    match state.manager.cancel().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&e),
    }
}

/// POST /api/chat
///
/// Feed one chat message to the engine.
pub async fn post_chat(
    State(state): State<Arc<HostState>>,
    Json(message): Json<ChatMessage>,
) -> Json<ChatResponse> {
    let display_name = message.display_name.as_deref().unwrap_or_default();
    let accepted = state
        .manager
        .handle_answer(&message.username, display_name, &message.text)
        .await;
    Json(ChatResponse { accepted })
}
