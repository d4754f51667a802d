/**
 * Live Connection Handling
 *
 * `GET /ws?token=…` upgrades to a WebSocket after validating the session
 * token. Each accepted connection gets:
 *
 * - a **writer task** draining an unbounded channel into the socket; the
 *   channel's sender is the connection's presence entry, so everything
 *   delivered to this user goes through one serialized writer
 * - a **snapshot push**: the chat list immediately, then one history packet
 *   per chat from an independent task that never blocks the read loop
 * - a **read loop** (the ingestion side): well-formed `msg` packets are
 *   stamped with the authenticated sender and a server timestamp, then
 *   submitted to the shared bounded queue; malformed frames are dropped
 *   silently; only a transport failure ends the connection
 *
 * The read loop exiting is the only path that tears down this connection's
 * presence entry, and the teardown is conn-id guarded so it cannot evict a
 * newer connection for the same user.
 */

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use sqlx::PgPool;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::sessions::{authenticate, AuthedUser};
use crate::chat::db as chats;
use crate::error::ApiError;
use crate::messaging::db as messages;
use crate::realtime::packet::{InboundMessage, Packet};
use crate::realtime::presence::PresenceEntry;
use crate::server::state::AppState;
use crate::UserId;

/// Messages replayed per chat at connect time
pub const HISTORY_LIMIT: i64 = 50;

/// Query parameters of the WebSocket upgrade request
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Session token
    pub token: String,
}

/// WebSocket upgrade handler
///
/// # Errors
///
/// * `401 Unauthorized` - unknown or expired session token (the upgrade is
///   rejected synchronously)
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let user = authenticate(&state.db, &params.token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid token"))?;

    tracing::info!("[WS] Upgrade accepted for {}", user.username);

    Ok(ws.on_upgrade(move |socket| handle_socket(state, user, socket)))
}

/// Drive one live connection from upgrade to teardown.
async fn handle_socket(state: AppState, user: AuthedUser, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Packet>();
    let conn_id = Uuid::new_v4();

    // Writer task: the only place that writes this socket. It ends when
    // every sender clone is gone (teardown or supersession) or the socket
    // rejects a write.
    tokio::spawn(async move {
        while let Some(packet) = rx.recv().await {
            let json = match serde_json::to_string(&packet) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("[WS] Cannot serialize outbound packet: {}", e);
                    continue;
                }
            };
            if ws_tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // Register presence; dropping any superseded entry closes the old
    // connection's writer and with it the old socket.
    let replaced = state
        .presence
        .register(
            user.id,
            PresenceEntry {
                conn_id,
                tx: tx.clone(),
            },
        )
        .await;
    drop(replaced);

    // Snapshot: chat list first, so the client can render immediately.
    match chats::summarize(&state.db, user.id).await {
        Ok(list) => {
            let _ = tx.send(Packet::Chats { chats: list });
        }
        Err(e) => {
            tracing::warn!("[WS] Chat list for {} failed: {}", user.username, e);
        }
    }

    // History replay runs independently so a large backlog never delays
    // the read loop. Best-effort; failures are not retried.
    {
        let db = state.db.clone();
        let tx = tx.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            push_history(&db, user_id, &tx).await;
        });
    }

    // The registry entry must be the only long-lived sender from here on:
    // supersession drops that entry, which closes the channel, ends the
    // writer task, and closes this socket.
    drop(tx);

    // Ingestion loop.
    while let Some(frame) = ws_rx.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("[WS] Read failed for {}: {}", user.username, e);
                break;
            }
        };
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Ping/pong is handled by axum; binary frames are not part of
            // the protocol.
            _ => continue,
        };
        let packet = match serde_json::from_str::<Packet>(&text) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::debug!("[WS] Malformed packet from {} dropped: {}", user.username, e);
                continue;
            }
        };
        let Packet::Msg(msg) = packet else {
            // Server-to-client packet kinds sent by a client are ignored.
            continue;
        };
        if msg.text.is_empty() {
            continue;
        }

        let inbound = InboundMessage {
            sender_id: user.id,
            sender_name: user.username.clone(),
            address: msg.address,
            text: msg.text,
            ts: Utc::now().timestamp_millis(),
        };

        // Blocks when the queue is full: backpressure for this producer.
        if state.inbound_tx.send(inbound).await.is_err() {
            tracing::warn!("[WS] Dispatch queue closed, dropping connection");
            break;
        }
    }

    state.presence.unregister(user.id, conn_id).await;
    tracing::info!("[WS] Disconnected: {}", user.username);
}

/// Send one history packet per chat the user belongs to.
async fn push_history(db: &PgPool, user_id: UserId, tx: &mpsc::UnboundedSender<Packet>) {
    let chat_ids = match chats::chat_ids_for(db, user_id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!("[WS] History chat list for user {} failed: {}", user_id, e);
            return;
        }
    };

    for chat_id in chat_ids {
        match messages::recent(db, chat_id, HISTORY_LIMIT).await {
            Ok(history) => {
                if tx
                    .send(Packet::History {
                        chat_id,
                        messages: history,
                    })
                    .is_err()
                {
                    return; // connection already gone
                }
            }
            Err(e) => {
                tracing::warn!("[WS] History for chat {} failed: {}", chat_id, e);
            }
        }
    }
}
