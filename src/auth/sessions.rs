/**
 * Session Management
 *
 * Opaque session tokens persisted in the `sessions` table. A token is a
 * random UUID, valid for seven days; validation joins against `users` and
 * checks the expiry. Both HTTP requests and WebSocket upgrades authenticate
 * through [`authenticate`].
 */

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::UserId;

/// Session lifetime in days
const SESSION_TTL_DAYS: i64 = 7;

/// The identity resolved from a valid session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthedUser {
    /// User id
    pub id: UserId,
    /// Username
    pub username: String,
}

/// Issue a new session token for a user
///
/// # Returns
/// The token string to hand to the client
pub async fn create_session(pool: &PgPool, user_id: UserId) -> Result<String, sqlx::Error> {
    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(&token)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(token)
}

/// Resolve a session token to its user
///
/// # Returns
/// The authenticated identity, or None if the token is unknown or expired
pub async fn authenticate(pool: &PgPool, token: &str) -> Result<Option<AuthedUser>, sqlx::Error> {
    let row: Option<(UserId, String)> = sqlx::query_as(
        r#"
        SELECT u.id, u.username
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = $1 AND s.expires_at > NOW()
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(id, username)| AuthedUser { id, username }))
}

/// Delete expired session rows.
///
/// Expired tokens already fail authentication; this only reclaims storage.
pub async fn prune_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM sessions WHERE expires_at <= NOW()
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
