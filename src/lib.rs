//! Courier - Main Library
//!
//! Courier is a real-time messaging backend built with Rust, serving
//! authenticated users over live WebSocket connections with server-side
//! persistence in PostgreSQL.
//!
//! # Overview
//!
//! This library provides the core functionality for Courier, including:
//! - Session-token authentication (signup, login, directory search)
//! - Direct and group chats with durable membership
//! - A single-consumer dispatcher that persists then fans out messages
//! - Per-chat history replay on connect, so reconnecting clients catch up
//!
//! # Module Structure
//!
//! - **`auth`** - Users, password hashing, session tokens, auth handlers
//! - **`chat`** - Chat storage (direct resolution, groups, summaries) and
//!   chat management handlers
//! - **`messaging`** - Message persistence and history windows
//! - **`realtime`** - Wire packets, presence registry, dispatcher, and the
//!   WebSocket connection lifecycle
//! - **`middleware`** - Bearer-token extraction for protected routes
//! - **`routes`** - Router assembly
//! - **`server`** - Configuration, state, and initialization
//! - **`error`** - The `ApiError` type and HTTP response conversion
//!
//! # Usage
//!
//! ```rust,no_run
//! use courier::server::create_app;
//!
//! # async fn example() -> Result<(), sqlx::Error> {
//! let app = create_app().await?;
//! // Use app with axum::serve
//! # Ok(())
//! # }
//! ```

/// User accounts, sessions, and authentication handlers
pub mod auth;

/// Chat storage and management handlers
pub mod chat;

/// Error types and HTTP conversion
pub mod error;

/// Message persistence and history
pub mod messaging;

/// Request middleware (Bearer-token extraction)
pub mod middleware;

/// Wire packets, presence, dispatcher, WebSocket connections
pub mod realtime;

/// Router assembly
pub mod routes;

/// Server configuration, state, and initialization
pub mod server;

/// Database id of a user row
pub type UserId = i64;

/// Database id of a chat row
pub type ChatId = i64;

// Re-export the types most callers need
pub use error::ApiError;
pub use realtime::{Address, ChatSummary, HistoryEntry, MsgPacket, Packet};
pub use server::{create_app, AppState};
