/**
 * Authentication Extractor
 *
 * Resolves the `Authorization: Bearer <token>` header to an authenticated
 * identity by looking the token up in the sessions table. Handlers take
 * `AuthUser` as a parameter; extraction failing rejects the request with
 * 401 before the handler runs.
 */

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::sessions::{authenticate, AuthedUser};
use crate::error::ApiError;
use crate::server::state::AppState;

/// Axum extractor for the authenticated user
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthedUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!("Missing Authorization header");
                ApiError::unauthorized("missing Authorization header")
            })?;

        // Expected format: "Bearer <token>"
        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            tracing::warn!("Invalid Authorization header format");
            ApiError::unauthorized("invalid Authorization header")
        })?;

        let user = authenticate(&state.db, token)
            .await?
            .ok_or_else(|| ApiError::unauthorized("invalid or expired token"))?;

        Ok(AuthUser(user))
    }
}
