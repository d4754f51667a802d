/**
 * Chat Management Handlers
 *
 * The out-of-band HTTP surface for chat creation and user search, all of
 * which require a Bearer session token:
 *
 * - `GET /users/search?q=…` - directory search, requester excluded
 * - `POST /chats/direct` - get-or-create the direct chat with a peer
 * - `POST /chats/group` - create a group chat with a title and members
 *
 * Both creation endpoints push a refreshed chat list over the live
 * connection of every affected user that is currently present, so open
 * clients see the new chat without a reconnect.
 */

use std::collections::BTreeSet;

use axum::extract::{Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::auth::users::{get_user_id, search_users, UserSummary};
use crate::chat::db as chats;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::realtime::dispatcher::push_chat_lists;
use crate::server::state::AppState;
use crate::{ChatId, UserId};

/// Result cap for directory search
const SEARCH_LIMIT: i64 = 20;

/// Query parameters for `GET /users/search`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Substring to match against username or display name
    #[serde(default)]
    pub q: String,
}

/// Request body for `POST /chats/direct`
#[derive(Debug, Deserialize)]
pub struct CreateDirectRequest {
    /// Peer username
    pub username: String,
}

/// Request body for `POST /chats/group`
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    /// Group title
    pub title: String,
    /// Usernames to add (the creator is always included)
    pub usernames: Vec<String>,
}

/// Response body for both chat-creation endpoints
#[derive(Debug, Serialize)]
pub struct ChatCreatedResponse {
    /// Id of the resolved or created chat
    pub chat_id: ChatId,
}

/// Directory search handler
///
/// An empty query returns an empty list rather than the whole directory.
pub async fn search(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    if params.q.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let users = search_users(&state.db, &user.username, &params.q, SEARCH_LIMIT).await?;
    Ok(Json(users))
}

/// Direct-chat creation handler
///
/// Resolves (or lazily creates) the one direct chat between the requester
/// and the named peer, then pushes a fresh chat list to both if present.
///
/// # Errors
///
/// * `400 Bad Request` - peer is the requester
/// * `404 Not Found` - unknown peer username
pub async fn create_direct(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateDirectRequest>,
) -> Result<Json<ChatCreatedResponse>, ApiError> {
    let peer_id = get_user_id(&state.db, &request.username)
        .await?
        .ok_or_else(|| ApiError::not_found("peer not found"))?;
    if peer_id == user.id {
        return Err(ApiError::validation("cannot open a chat with yourself"));
    }

    let chat_id = chats::resolve_direct(&state.db, user.id, peer_id).await?;
    tracing::info!(
        "[Chat] Direct chat {} between {} and {}",
        chat_id,
        user.username,
        request.username
    );

    push_chat_lists(&state.db, &state.presence, &[user.id, peer_id]).await;

    Ok(Json(ChatCreatedResponse { chat_id }))
}

/// Group-chat creation handler
///
/// Creates the group atomically (owner always a member, duplicates
/// collapsed) and pushes a fresh chat list to every member present.
///
/// # Errors
///
/// * `400 Bad Request` - empty title or empty member list
/// * `404 Not Found` - any unknown member username
pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateGroupRequest>,
) -> Result<Json<ChatCreatedResponse>, ApiError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    if request.usernames.is_empty() {
        return Err(ApiError::validation("at least one member is required"));
    }

    // Resolve every named member before touching storage, so an unknown
    // username fails the whole request cleanly.
    let mut member_ids: Vec<UserId> = Vec::with_capacity(request.usernames.len());
    for username in &request.usernames {
        let id = get_user_id(&state.db, username)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("unknown member '{}'", username)))?;
        member_ids.push(id);
    }

    let chat_id = chats::create_group(&state.db, user.id, title, &member_ids).await?;
    tracing::info!(
        "[Chat] Group chat {} \"{}\" created by {}",
        chat_id,
        title,
        user.username
    );

    let roster = notify_roster(&member_ids, user.id);
    push_chat_lists(&state.db, &state.presence, &roster).await;

    Ok(Json(ChatCreatedResponse { chat_id }))
}

/// Everyone to notify after group creation: the members plus the owner,
/// duplicates collapsed so nobody gets the same chat list twice.
fn notify_roster(member_ids: &[UserId], owner_id: UserId) -> Vec<UserId> {
    let mut roster: BTreeSet<UserId> = member_ids.iter().copied().collect();
    roster.insert(owner_id);
    roster.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_roster_adds_owner_once() {
        assert_eq!(notify_roster(&[2, 3], 1), vec![1, 2, 3]);
        // Owner listed among the members must not be duplicated.
        assert_eq!(notify_roster(&[2, 1, 3], 1), vec![1, 2, 3]);
    }

    #[test]
    fn test_notify_roster_collapses_duplicate_members() {
        assert_eq!(notify_roster(&[3, 2, 3], 1), vec![1, 2, 3]);
    }
}
