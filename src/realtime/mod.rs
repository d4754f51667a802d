//! Realtime Module
//!
//! The live-connection side of the system: the wire packet types, the
//! presence registry, the per-connection ingestion loop, and the single
//! dispatcher that persists and fans out every message.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs        - Module exports
//! ├── packet.rs     - Wire envelope (msg / chats / history)
//! ├── presence.rs   - user → live-connection registry
//! ├── dispatcher.rs - queue consumer: persist, resolve, deliver
//! └── connection.rs - WebSocket upgrade, read loop, snapshot push
//! ```
//!
//! # Concurrency model
//!
//! One task per connection (read loop) plus one writer task per connection
//! and exactly one dispatcher. Connections never mutate shared state
//! directly: they stamp and enqueue. The dispatcher is the only consumer
//! of the queue and the only code that walks the presence registry for
//! delivery, so ordering per recipient is queue order.

/// Wire packet types
pub mod packet;

/// Live-connection registry
pub mod presence;

/// The message dispatcher
pub mod dispatcher;

/// WebSocket connection lifecycle
pub mod connection;

// Re-export commonly used types
pub use dispatcher::QUEUE_CAPACITY;
pub use packet::{Address, ChatSummary, HistoryEntry, InboundMessage, MsgPacket, Packet};
pub use presence::{PresenceEntry, PresenceRegistry};
