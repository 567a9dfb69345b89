use std::collections::HashSet;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Extension,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::{
    dto::chat_dto::{InboundChatEvent, OutboundChatEvent},
    middleware::auth::Claims,
    models::request::RequestStatus,
    utils::time::chat_timestamp,
    AppState,
};

/// WebSocket endpoint for request-scoped chat. The connection is already
/// authenticated by the bearer middleware; room membership is checked per
/// `join` against the owning customer / pharmacist rule.
#[axum::debug_handler]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, claims))
}

async fn handle_socket(stream: WebSocket, state: AppState, claims: Claims) {
    let Ok(user_id) = claims.sub.parse::<Uuid>() else {
        tracing::warn!(sub = %claims.sub, "rejecting socket with malformed subject");
        return;
    };

    let (mut sender, mut receiver) = stream.split();
    // Room broadcasts from every joined channel funnel into one outbound queue.
    let (tx, mut rx) = mpsc::channel::<OutboundChatEvent>(32);
    let mut joined: HashSet<i64> = HashSet::new();

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                let Ok(frame) = serde_json::to_string(&event) else { continue };
                if sender.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let event = match serde_json::from_str::<InboundChatEvent>(&text) {
                            Ok(event) => event,
                            Err(e) => {
                                tracing::warn!(error = %e, "ignoring malformed chat frame");
                                continue;
                            }
                        };
                        handle_event(&state, &claims, user_id, event, &tx, &mut joined).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }
}

async fn handle_event(
    state: &AppState,
    claims: &Claims,
    user_id: Uuid,
    event: InboundChatEvent,
    tx: &mpsc::Sender<OutboundChatEvent>,
    joined: &mut HashSet<i64>,
) {
    match event {
        InboundChatEvent::Join { room } => {
            let Ok(request_id) = room.parse::<i64>() else {
                tracing::warn!(room = %room, "ignoring join with non-numeric room");
                return;
            };
            if joined.contains(&request_id) {
                return;
            }
            if let Err(e) = state
                .chat_service
                .authorize_join(request_id, user_id, claims.role)
                .await
            {
                tracing::warn!(request_id, username = %claims.username, error = %e, "join denied");
                return;
            }

            let mut room_rx = BroadcastStream::new(state.broadcaster.subscribe(request_id));
            let forward = tx.clone();
            // Forwarder ends when the room channel closes or the connection
            // drops its queue.
            tokio::spawn(async move {
                while let Some(event) = room_rx.next().await {
                    // Lagged receivers skip frames, they do not lose the room.
                    let Ok(event) = event else { continue };
                    if forward.send(event).await.is_err() {
                        break;
                    }
                }
            });
            joined.insert(request_id);
        }

        InboundChatEvent::SendMessage { request_id, msg } => {
            if let Err(e) = state
                .chat_service
                .authorize_join(request_id, user_id, claims.role)
                .await
            {
                tracing::warn!(request_id, username = %claims.username, error = %e, "message denied");
                return;
            }
            match state.chat_service.post_message(request_id, user_id, &msg).await {
                Ok(message) => {
                    // Persisted and committed before anyone hears about it.
                    state.broadcaster.publish(
                        request_id,
                        OutboundChatEvent::ReceiveMessage {
                            username: claims.username.clone(),
                            msg: message.message_text,
                            timestamp: chat_timestamp(message.created_at),
                        },
                    );
                }
                Err(e) => {
                    tracing::error!(request_id, error = %e, "failed to persist chat message");
                }
            }
        }

        InboundChatEvent::ChangeStatus { request_id, status } => {
            let Ok(status) = status.parse::<RequestStatus>() else {
                tracing::warn!(request_id, status = %status, "ignoring unknown status value");
                return;
            };
            match state
                .chat_service
                .change_status(request_id, claims.role, status)
                .await
            {
                Ok(Some(stored)) => {
                    state
                        .broadcaster
                        .publish(request_id, OutboundChatEvent::StatusUpdated { status: stored });
                }
                // Non-pharmacist caller or missing request: no effect, no frame.
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(request_id, error = %e, "failed to change request status");
                }
            }
        }
    }
}
