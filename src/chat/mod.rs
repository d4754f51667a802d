//! Chat Module
//!
//! Chat identity and membership: the durable record of which chats exist,
//! who belongs to them, and the per-user chat-list digest.
//!
//! # Architecture
//!
//! - **`db`** - the chat identity store: direct-chat resolution, group
//!   creation, membership queries, chat summaries
//! - **`handlers`** - the out-of-band HTTP surface (`/users/search`,
//!   `/chats/direct`, `/chats/group`)
//!
//! A direct chat's identity is determined solely by the unordered pair of
//! its two members; at most one row ever exists per pair, enforced by a
//! partial unique index. Group chats are identified independently of their
//! membership and always contain their owner.

/// Chat identity store: database operations
pub mod db;

/// Out-of-band chat management handlers
pub mod handlers;
