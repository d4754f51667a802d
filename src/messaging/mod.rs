//! Messaging Module
//!
//! The message store: append-only, per-chat ordered message rows. Messages
//! are immutable once written; ordering within a chat is the storage-assigned
//! `send_at` timestamp with the row id as tie-break.

/// Message store: database operations
pub mod db;
