/**
 * Signup and Login Handlers
 *
 * POST /signup - create an account and an initial session
 * POST /login  - verify credentials and issue a session
 *
 * # Security
 *
 * - Passwords are hashed with bcrypt; they are never logged or returned
 * - A taken username returns 409, an unknown user 404, a wrong password 401
 */

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::sessions::create_session;
use crate::auth::users::{create_user, display_name_from_parts, get_user_by_username, username_exists};
use crate::error::ApiError;

/// Signup request body
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Chosen username
    pub username: String,
    /// First name (required)
    pub first_name: String,
    /// Last name (optional)
    #[serde(default)]
    pub last_name: Option<String>,
    /// Plaintext password
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username
    pub username: String,
    /// Plaintext password
    pub password: String,
}

/// Response for both signup and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Session token
    pub token: String,
    /// Username the session belongs to
    pub username: String,
}

/// Signup handler
///
/// Creates the user row with a bcrypt password hash and issues an initial
/// session token.
///
/// # Errors
///
/// * `400 Bad Request` - empty username, first name, or password
/// * `409 Conflict` - username already taken
pub async fn signup(
    State(pool): State<PgPool>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let username = request.username.trim();
    if username.is_empty() || request.first_name.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::validation(
            "username, first_name and password are required",
        ));
    }

    if username_exists(&pool, username).await? {
        return Err(ApiError::conflict("username taken"));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::validation(format!("cannot hash password: {}", e)))?;

    let display_name = display_name_from_parts(&request.first_name, request.last_name.as_deref());
    let user = create_user(&pool, username, &display_name, &password_hash).await?;

    let token = create_session(&pool, user.id).await?;

    tracing::info!("[Auth] New user registered: {}", user.username);

    Ok(Json(AuthResponse {
        token,
        username: user.username,
    }))
}

/// Login handler
///
/// # Errors
///
/// * `404 Not Found` - unknown username
/// * `401 Unauthorized` - wrong password
pub async fn login(
    State(pool): State<PgPool>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = get_user_by_username(&pool, &request.username)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    let valid = bcrypt::verify(&request.password, &user.password_hash)
        .map_err(|e| ApiError::unauthorized(format!("password verification failed: {}", e)))?;
    if !valid {
        tracing::warn!("[Auth] Wrong password for: {}", user.username);
        return Err(ApiError::unauthorized("wrong password"));
    }

    let token = create_session(&pool, user.id).await?;

    tracing::info!("[Auth] Login: {}", user.username);

    Ok(Json(AuthResponse {
        token,
        username: user.username,
    }))
}
