//! API Routes

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use futures::{SinkExt, StreamExt};

use crate::error::Error;
use crate::event_log::EventPayload;
use crate::models::{ApiResponse, EventAccepted};
use crate::scoring::PreferenceProfile;
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Sessions
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/profile", put(set_profile))
        .route("/api/sessions/:id/tick", post(tick_session))
        // Event log append boundary
        .route("/api/sessions/:id/events", post(append_event))
        // Control channel
        .route("/api/sessions/:id/commands/ws", get(commands_ws))
        .with_state(state)
}

// ========================================
// Session Handlers
// ========================================

async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.sessions.get(&id).await {
        Some(session) => Json(ApiResponse::success(session)).into_response(),
        None => Error::NotFound(format!("Session {} not found", id)).into_response(),
    }
}

/// Idempotent preference upsert; creates the session on first use
async fn set_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(profile): Json<PreferenceProfile>,
) -> impl IntoResponse {
    match state.sessions.set_profile(&id, profile).await {
        Ok(session) => Json(ApiResponse::success(session)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// The driving interface: one decision tick, invoked by an external scheduler
async fn tick_session(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.director.tick(&id).await {
        Ok(outcome) => Json(ApiResponse::success(outcome)).into_response(),
        Err(e) => e.into_response(),
    }
}

// ========================================
// Event Log Handlers
// ========================================

/// Append one scored sensor event to a session's log
async fn append_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<EventPayload>,
) -> impl IntoResponse {
    let sequence_id = state.event_log.append(&id, payload).await;
    (
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(EventAccepted {
            session_id: id,
            sequence_id,
        })),
    )
        .into_response()
}

// ========================================
// Control Channel (WebSocket)
// ========================================

async fn commands_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_commands_socket(socket, state, id))
}

/// Forward a session's switch commands to a WebSocket client
async fn handle_commands_socket(socket: WebSocket, state: AppState, session_id: String) {
    let (mut sender, mut receiver) = socket.split();
    let (subscriber_id, mut rx) = state.publisher.subscribe(&session_id).await;

    tracing::info!(
        session_id = %session_id,
        subscriber_id = %subscriber_id,
        "Control channel client connected"
    );

    // Forward published commands to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // Drain the client side until it closes
    let recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    state.publisher.unsubscribe(&session_id, &subscriber_id).await;
    tracing::info!(
        session_id = %session_id,
        subscriber_id = %subscriber_id,
        "Control channel client disconnected"
    );
}
