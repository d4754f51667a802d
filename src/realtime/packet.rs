/**
 * Wire Packet Types
 *
 * This module defines the JSON envelope exchanged over the live WebSocket
 * connection. Packets are tagged by a `type` field:
 *
 * - `msg` - a chat message (client→server to send, server→client on delivery)
 * - `chats` - the user's chat list with last-activity digests (server→client)
 * - `history` - recent messages for one chat, sent at connect time
 *   (server→client)
 *
 * A `msg` packet is addressed either to a peer by username (direct chat) or
 * to an existing chat by id (group chat). The two addressing modes are an
 * explicit enum rather than an optional chat id, so a missing target is a
 * parse error instead of a silent zero.
 */

use serde::{Deserialize, Serialize};

use crate::{ChatId, UserId};

/// Message target: a peer (direct chat, resolved server-side) or a chat id.
///
/// On the wire this is the presence of either a `to` field or a `chat_id`
/// field on the `msg` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Address {
    /// Addressed to an existing chat (group chats, or a known direct chat)
    Chat {
        /// Target chat id
        chat_id: ChatId,
    },
    /// Addressed to a peer by username; the direct chat is resolved lazily
    Peer {
        /// Target username
        to: String,
    },
}

/// A chat message envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgPacket {
    /// Message target
    #[serde(flatten)]
    pub address: Address,
    /// Sender username. Absent on client-sent packets; the server stamps it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Message body
    pub text: String,
    /// Send timestamp in unix milliseconds. Stamped by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

/// One entry in the user's chat list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    /// Chat id
    pub chat_id: ChatId,
    /// Whether this is a group chat
    pub is_group: bool,
    /// Group title (empty for direct chats)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Peer username (empty for group chats)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Display text: group title or the peer's display name
    pub display: String,
    /// Last message preview (empty if the chat has no messages yet)
    pub last_msg: String,
    /// Last activity in unix milliseconds (0 if no messages yet)
    pub last_at: i64,
}

/// One replayed message inside a `history` packet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Sender username
    pub from: String,
    /// Message body
    pub text: String,
    /// Send timestamp in unix milliseconds
    pub ts: i64,
}

/// The wire packet envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Packet {
    /// A chat message
    Msg(MsgPacket),
    /// The full chat list for the connected user
    Chats {
        /// Chat summaries, most recent activity first
        chats: Vec<ChatSummary>,
    },
    /// Recent messages for one chat, oldest first
    History {
        /// Chat the messages belong to
        chat_id: ChatId,
        /// Replayed messages in chronological order
        messages: Vec<HistoryEntry>,
    },
}

/// A validated inbound message, stamped by the ingestion loop and queued
/// for the dispatcher.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Authenticated sender id
    pub sender_id: UserId,
    /// Authenticated sender username
    pub sender_name: String,
    /// Message target as sent by the client
    pub address: Address,
    /// Message body
    pub text: String,
    /// Server-assigned send timestamp (unix milliseconds)
    pub ts: i64,
}
