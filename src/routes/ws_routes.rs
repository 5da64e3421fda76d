use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn};

use crate::models::{ChatRequest, WsChatRequest, WsEvent};
use crate::service::chat_service::ChatService;

/// GET `/ws/chat` — upgrades to a WebSocket carrying chat turns.
pub async fn ws_chat_handler(
    ws: WebSocketUpgrade,
    State(svc): State<ChatService>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, svc))
}

/// Handles a single WebSocket connection.
///
/// Protocol:
/// - Client sends JSON `{ "conversation_id": "...|null", "user_id": "...|null", "message": "..." }`
/// - Server replies with:
///   1. `{ "type": "turn_start", "conversation_id": "..." }`
///   2. `{ "type": "assistant", "message": {...}, "title_headline"?: {...}, "event_draft"?: {...} }`
///   or `{ "type": "error", "message": "..." }` on failure.
async fn handle_socket(socket: WebSocket, svc: ChatService) {
    info!("WebSocket client connected");
    let (mut sink, mut stream) = socket.split();

    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("WebSocket receive error: {e}");
                break;
            }
        };

        // Only handle text messages
        let text = match &msg {
            Message::Text(t) => t.to_string(),
            Message::Close(_) => break,
            _ => continue,
        };

        let ws_req: WsChatRequest = match serde_json::from_str(&text) {
            Ok(r) => r,
            Err(e) => {
                send_event(&mut sink, &WsEvent::Error {
                    message: format!("Invalid request: {e}"),
                }).await;
                continue;
            }
        };

        let chat_request = ChatRequest {
            conversation_id: ws_req.conversation_id,
            user_id: ws_req.user_id,
            message: ws_req.message,
        };

        // ── Prepare: validate, resolve conversation, save user message ────
        let ctx = match svc.prepare_chat(chat_request).await {
            Ok(ctx) => ctx,
            Err(e) => {
                send_event(&mut sink, &WsEvent::Error {
                    message: e.to_string(),
                }).await;
                continue;
            }
        };

        send_event(&mut sink, &WsEvent::TurnStart {
            conversation_id: ctx.conversation_id.clone(),
        }).await;

        // ── Run the model turn and relay the parsed reply ─────────────────
        match svc.complete_turn(ctx).await {
            Ok(response) => {
                send_event(&mut sink, &WsEvent::Assistant {
                    message: response.message,
                    title_headline: response.title_headline,
                    event_draft: response.event_draft,
                }).await;
            }
            Err(e) => {
                send_event(&mut sink, &WsEvent::Error {
                    message: e.to_string(),
                }).await;
            }
        }
    }

    info!("WebSocket client disconnected");
}

/// Helper: serialize a `WsEvent` and send it over the socket.
async fn send_event(sink: &mut SplitSink<WebSocket, Message>, event: &WsEvent) {
    if let Ok(json) = serde_json::to_string(event) {
        let _ = sink.send(Message::Text(json.into())).await;
    }
}
