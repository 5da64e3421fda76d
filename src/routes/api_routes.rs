use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{ChatRequest, CreateEventRequest};
use crate::service::chat_service::ChatService;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST `/api/chat` — runs one chat turn, returns the assistant reply plus
/// any structured payloads parsed out of it.
pub async fn chat_handler(
    State(svc): State<ChatService>,
    Json(request): Json<ChatRequest>,
) -> Response {
    match svc.chat(request).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET `/api/conversations` — list conversations, most recent first.
pub async fn list_conversations_handler(State(svc): State<ChatService>) -> Response {
    match svc.get_conversations().await {
        Ok(conversations) => Json(conversations).into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET `/api/conversations/:id/messages` — messages for a conversation.
pub async fn list_messages_handler(
    Path(id): Path<String>,
    State(svc): State<ChatService>,
) -> Response {
    match svc.get_messages(&id).await {
        Ok(messages) => Json(messages).into_response(),
        Err(err) => error_response(&err),
    }
}

/// POST `/api/events` — create an event from a confirmed draft.
pub async fn create_event_handler(
    State(svc): State<ChatService>,
    Json(request): Json<CreateEventRequest>,
) -> Response {
    match svc.create_event(request).await {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET `/api/events` — list created events, newest first.
pub async fn list_events_handler(State(svc): State<ChatService>) -> Response {
    match svc.get_events().await {
        Ok(events) => Json(events).into_response(),
        Err(err) => error_response(&err),
    }
}

// ── Helper ────────────────────────────────────────────────────────────────────

fn error_response(err: &AppError) -> Response {
    let status = if err.is_validation() {
        StatusCode::BAD_REQUEST
    } else if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if err.is_agent_unavailable() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorBody { error: err.to_string() })).into_response()
}
