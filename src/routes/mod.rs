//! Route Configuration Module
//!
//! This module configures all HTTP routes for the server.
//!
//! # Route Organization
//!
//! - **`router`** - Main router creation and route assembly
//!
//! # Route Types
//!
//! ## Authentication Routes
//!
//! - `POST /signup` - User registration
//! - `POST /login` - User login
//!
//! ## Chat Routes
//!
//! - `GET /users/search` - Directory search (requires authentication)
//! - `POST /chats/direct` - Get-or-create direct chat (requires authentication)
//! - `POST /chats/group` - Create group chat (requires authentication)
//!
//! ## Real-Time Routes
//!
//! - `GET /ws` - WebSocket upgrade, `?token=...` session token

/// Main router creation
pub mod router;

pub use router::create_router;
