/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Authentication routes (signup, login)
 * 2. Chat management routes (search, direct, group)
 * 3. WebSocket upgrade route
 * 4. Fallback handler (404)
 */

use axum::Router;

use crate::auth::handlers::{login, signup};
use crate::chat::handlers::{create_direct, create_group, search};
use crate::realtime::connection::ws_handler;
use crate::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Route Details
///
/// ## Authentication
///
/// - `POST /signup` - User registration, returns a session token
/// - `POST /login` - User login, returns a session token
///
/// ## Chat Management
///
/// Requires a `Bearer` session token in the `Authorization` header:
///
/// - `GET /users/search?q=...` - Directory search
/// - `POST /chats/direct` - Get-or-create the direct chat with a peer
/// - `POST /chats/group` - Create a group chat
///
/// ## Real-Time
///
/// - `GET /ws?token=...` - WebSocket upgrade, authenticated by session token
///
/// ## Fallback
///
/// The fallback handler returns 404 for unknown routes.
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/signup", axum::routing::post(signup))
        .route("/login", axum::routing::post(login))
        .route("/users/search", axum::routing::get(search))
        .route("/chats/direct", axum::routing::post(create_direct))
        .route("/chats/group", axum::routing::post(create_group))
        .route("/ws", axum::routing::get(ws_handler))
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .with_state(app_state)
}
