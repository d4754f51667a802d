//! Authentication Module
//!
//! User accounts, session tokens, and the signup/login HTTP handlers.
//!
//! # Architecture
//!
//! - **`users`** - user table operations (create, lookup, search)
//! - **`sessions`** - opaque session tokens persisted with an expiry
//! - **`handlers`** - `POST /signup` and `POST /login`
//!
//! The session token is the single credential: HTTP requests carry it as a
//! Bearer header, the WebSocket upgrade carries it as a query parameter.
//! Both paths resolve it through [`sessions::authenticate`].

/// User model and database operations
pub mod users;

/// Session token issue and validation
pub mod sessions;

/// Signup and login handlers
pub mod handlers;

pub use sessions::{authenticate, AuthedUser};
pub use users::User;
