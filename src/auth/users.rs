/**
 * User Model and Database Operations
 *
 * This module handles user rows: creation at signup, lookup by username,
 * and the directory search backing `GET /users/search`.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::UserId;

/// User struct representing a user in the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user id
    pub id: UserId,
    /// Username (unique)
    pub username: String,
    /// Name shown in chat lists and search results
    pub display_name: String,
    /// Hashed password (bcrypt)
    pub password_hash: String,
    /// Created at timestamp
    pub created_at: DateTime<Utc>,
}

/// Minimal user info returned by directory search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    /// Unique username
    pub username: String,
    /// Name shown in the UI
    pub display_name: String,
}

/// Create a new user
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `username` - Chosen username (caller checks uniqueness first for a
///   friendly error; the unique constraint is the backstop)
/// * `display_name` - Name shown to other users
/// * `password_hash` - Hashed password
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    display_name: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, display_name, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, username, display_name, password_hash, created_at
        "#,
    )
    .bind(username)
    .bind(display_name)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

/// Get user by username
///
/// # Returns
/// User or None if not found
pub async fn get_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, display_name, password_hash, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Get a user's id by username
///
/// # Returns
/// User id or None if the username is unknown
pub async fn get_user_id(pool: &PgPool, username: &str) -> Result<Option<UserId>, sqlx::Error> {
    let id: Option<(UserId,)> = sqlx::query_as(
        r#"
        SELECT id FROM users WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(id.map(|(id,)| id))
}

/// Check whether a username is already taken
pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)
        "#,
    )
    .bind(username)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Search users by username or display name
///
/// Partial, case-insensitive match on either field. The requester is
/// excluded from the results; results are alphabetical and bounded.
pub async fn search_users(
    pool: &PgPool,
    requester: &str,
    query: &str,
    limit: i64,
) -> Result<Vec<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT username, display_name
        FROM users
        WHERE (username ILIKE '%'||$1||'%' OR display_name ILIKE '%'||$1||'%')
          AND username <> $2
        ORDER BY username
        LIMIT $3
        "#,
    )
    .bind(query)
    .bind(requester)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Build the display name stored at signup from first and last name.
///
/// The last name is optional; whitespace is trimmed on both parts.
pub fn display_name_from_parts(first_name: &str, last_name: Option<&str>) -> String {
    let first = first_name.trim();
    match last_name.map(str::trim).filter(|s| !s.is_empty()) {
        Some(last) => format!("{} {}", first, last),
        None => first.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_name_with_last_name() {
        assert_eq!(display_name_from_parts("Alice", Some("Quinn")), "Alice Quinn");
    }

    #[test]
    fn test_display_name_without_last_name() {
        assert_eq!(display_name_from_parts("Alice", None), "Alice");
        assert_eq!(display_name_from_parts("Alice", Some("  ")), "Alice");
    }

    #[test]
    fn test_display_name_trims_whitespace() {
        assert_eq!(display_name_from_parts(" Alice ", Some(" Quinn ")), "Alice Quinn");
    }
}
