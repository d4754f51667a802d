//! Middleware Module
//!
//! Request-processing helpers shared by the HTTP handlers. Currently:
//!
//! - **`auth`** - the Bearer-token session extractor

pub mod auth;

pub use auth::AuthUser;
