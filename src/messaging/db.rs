//! Database operations for messages
//!
//! Append and bounded retrieval. `recent` backs the reconnect history
//! replay: it returns the most recent window of a chat, oldest first, so
//! the client can render it in order.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::realtime::packet::HistoryEntry;
use crate::{ChatId, UserId};

/// A persisted message row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredMessage {
    /// Message id
    pub id: i64,
    /// Owning chat
    pub chat_id: ChatId,
    /// Sender id
    pub sender_id: UserId,
    /// Message body
    pub text: String,
    /// Storage-assigned send timestamp
    pub send_at: DateTime<Utc>,
}

/// Append a message to a chat.
///
/// The send timestamp is assigned by storage, which keeps ordering within
/// a chat consistent with insertion order.
pub async fn append(
    pool: &PgPool,
    chat_id: ChatId,
    sender_id: UserId,
    text: &str,
) -> Result<StoredMessage, sqlx::Error> {
    sqlx::query_as::<_, StoredMessage>(
        r#"
        INSERT INTO messages (chat_id, sender_id, text)
        VALUES ($1, $2, $3)
        RETURNING id, chat_id, sender_id, text, send_at
        "#,
    )
    .bind(chat_id)
    .bind(sender_id)
    .bind(text)
    .fetch_one(pool)
    .await
}

/// The most recent `limit` messages of a chat, oldest first.
///
/// The inner query selects the newest window; the outer re-sorts it into
/// chronological order for replay. Ties on `send_at` break by message id.
pub async fn recent(
    pool: &PgPool,
    chat_id: ChatId,
    limit: i64,
) -> Result<Vec<HistoryEntry>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT w.sender, w.text, w.ts
        FROM (
            SELECT u.username AS sender,
                   m.text,
                   (EXTRACT(EPOCH FROM m.send_at) * 1000)::BIGINT AS ts,
                   m.send_at,
                   m.id
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.chat_id = $1
            ORDER BY m.send_at DESC, m.id DESC
            LIMIT $2
        ) w
        ORDER BY w.send_at ASC, w.id ASC
        "#,
    )
    .bind(chat_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| HistoryEntry {
            from: row.get("sender"),
            text: row.get("text"),
            ts: row.get("ts"),
        })
        .collect())
}
