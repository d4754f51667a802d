//! Database operations for chat identity and membership
//!
//! This is the single authority on which chats exist and who belongs to
//! them. Direct chats are keyed by their canonical member pair
//! (`user_lo < user_hi`); a partial unique index guarantees at most one
//! direct chat per pair even under concurrent resolution, so the insert
//! here uses `ON CONFLICT DO NOTHING` plus a re-select instead of relying
//! on in-process serialization.

use std::collections::BTreeSet;

use sqlx::{PgPool, Row};

use crate::realtime::packet::ChatSummary;
use crate::{ChatId, UserId};

/// One chat member: id plus username (delivery needs both).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ChatMember {
    /// User id
    pub user_id: UserId,
    /// Username
    pub username: String,
}

/// Put a user pair into canonical order (lower id first).
///
/// Returns None for a self-pair; a direct chat needs two distinct members.
pub fn normalize_pair(a: UserId, b: UserId) -> Option<(UserId, UserId)> {
    match a.cmp(&b) {
        std::cmp::Ordering::Less => Some((a, b)),
        std::cmp::Ordering::Greater => Some((b, a)),
        std::cmp::Ordering::Equal => None,
    }
}

/// Resolve the direct chat for a user pair, creating it if absent.
///
/// Idempotent regardless of argument order. Concurrent calls for the same
/// pair converge on one chat row: the loser of the insert race re-selects
/// the winner's row.
///
/// # Errors
///
/// Returns `sqlx::Error::RowNotFound` for a self-pair, and storage errors
/// as-is.
pub async fn resolve_direct(pool: &PgPool, a: UserId, b: UserId) -> Result<ChatId, sqlx::Error> {
    let (lo, hi) = normalize_pair(a, b).ok_or(sqlx::Error::RowNotFound)?;

    // Fast path: the chat already exists.
    let existing: Option<(ChatId,)> = sqlx::query_as(
        r#"
        SELECT id FROM chats
        WHERE is_group = FALSE AND user_lo = $1 AND user_hi = $2
        "#,
    )
    .bind(lo)
    .bind(hi)
    .fetch_optional(pool)
    .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let mut tx = pool.begin().await?;

    let inserted: Option<(ChatId,)> = sqlx::query_as(
        r#"
        INSERT INTO chats (is_group, user_lo, user_hi)
        VALUES (FALSE, $1, $2)
        ON CONFLICT (user_lo, user_hi) WHERE NOT is_group DO NOTHING
        RETURNING id
        "#,
    )
    .bind(lo)
    .bind(hi)
    .fetch_optional(&mut *tx)
    .await?;

    let chat_id = match inserted {
        Some((id,)) => {
            sqlx::query(
                r#"
                INSERT INTO chat_members (chat_id, user_id)
                VALUES ($1, $2), ($1, $3)
                "#,
            )
            .bind(id)
            .bind(lo)
            .bind(hi)
            .execute(&mut *tx)
            .await?;
            id
        }
        None => {
            // Lost the creation race; the winner's row is committed.
            let (id,): (ChatId,) = sqlx::query_as(
                r#"
                SELECT id FROM chats
                WHERE is_group = FALSE AND user_lo = $1 AND user_hi = $2
                "#,
            )
            .bind(lo)
            .bind(hi)
            .fetch_one(&mut *tx)
            .await?;
            id
        }
    };

    tx.commit().await?;
    Ok(chat_id)
}

/// Create a group chat with its membership in one transaction.
///
/// The owner is always a member; duplicates in `member_ids` (including the
/// owner) are collapsed. Any membership insert failure rolls back the chat
/// row too.
pub async fn create_group(
    pool: &PgPool,
    owner_id: UserId,
    title: &str,
    member_ids: &[UserId],
) -> Result<ChatId, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let (chat_id,): (ChatId,) = sqlx::query_as(
        r#"
        INSERT INTO chats (is_group, title, owner_id)
        VALUES (TRUE, $1, $2)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(owner_id)
    .fetch_one(&mut *tx)
    .await?;

    let mut members: BTreeSet<UserId> = member_ids.iter().copied().collect();
    members.insert(owner_id);

    for user_id in members {
        sqlx::query(
            r#"
            INSERT INTO chat_members (chat_id, user_id) VALUES ($1, $2)
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(chat_id)
}

/// All current members of a chat.
pub async fn members_of(pool: &PgPool, chat_id: ChatId) -> Result<Vec<ChatMember>, sqlx::Error> {
    sqlx::query_as::<_, ChatMember>(
        r#"
        SELECT u.id AS user_id, u.username
        FROM chat_members cm
        JOIN users u ON u.id = cm.user_id
        WHERE cm.chat_id = $1
        ORDER BY u.id
        "#,
    )
    .bind(chat_id)
    .fetch_all(pool)
    .await
}

/// Whether a user belongs to a chat.
pub async fn is_member(pool: &PgPool, chat_id: ChatId, user_id: UserId) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM chat_members WHERE chat_id = $1 AND user_id = $2
        )
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Ids of every chat a user belongs to.
pub async fn chat_ids_for(pool: &PgPool, user_id: UserId) -> Result<Vec<ChatId>, sqlx::Error> {
    let rows: Vec<(ChatId,)> = sqlx::query_as(
        r#"
        SELECT chat_id FROM chat_members WHERE user_id = $1 ORDER BY chat_id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// The user's chat list, one summary per chat, most recent activity first.
///
/// Each row is annotated with the latest message (if any). Ordering falls
/// back to the chat's creation time when no message exists yet; ties break
/// deterministically by chat id, newest first.
pub async fn summarize(pool: &PgPool, user_id: UserId) -> Result<Vec<ChatSummary>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT
            c.id AS chat_id,
            c.is_group,
            COALESCE(c.title, '') AS title,
            CASE WHEN c.is_group THEN '' ELSE COALESCE(u.username, '') END AS username,
            CASE WHEN c.is_group THEN COALESCE(c.title, '')
                 ELSE COALESCE(u.display_name, '') END AS display,
            COALESCE(m.text, '') AS last_msg,
            COALESCE((EXTRACT(EPOCH FROM m.send_at) * 1000)::BIGINT, 0) AS last_at
        FROM chats c
        JOIN chat_members cm ON cm.chat_id = c.id AND cm.user_id = $1
        LEFT JOIN chat_members cm2
            ON cm2.chat_id = c.id AND cm2.user_id <> $1 AND NOT c.is_group
        LEFT JOIN users u ON u.id = cm2.user_id
        LEFT JOIN LATERAL (
            SELECT text, send_at
            FROM messages
            WHERE chat_id = c.id
            ORDER BY send_at DESC, id DESC
            LIMIT 1
        ) m ON TRUE
        ORDER BY COALESCE(m.send_at, c.created_at) DESC, c.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ChatSummary {
            chat_id: row.get("chat_id"),
            is_group: row.get("is_group"),
            title: row.get("title"),
            username: row.get("username"),
            display: row.get("display"),
            last_msg: row.get("last_msg"),
            last_at: row.get("last_at"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_pair_orders_lower_first() {
        assert_eq!(normalize_pair(5, 2), Some((2, 5)));
        assert_eq!(normalize_pair(2, 5), Some((2, 5)));
    }

    #[test]
    fn test_normalize_pair_rejects_self() {
        assert_eq!(normalize_pair(3, 3), None);
    }
}
