/**
 * Presence Registry
 *
 * Maps an authenticated user to its single live connection. A connection is
 * represented by an opaque send endpoint: an unbounded channel drained by
 * that connection's writer task. Sends never block.
 *
 * All mutation and lookup happens under one mutex, shared with the
 * dispatcher's delivery step via `lock()`, so a lookup-then-deliver sequence
 * cannot race with a concurrent disconnect of the same user.
 *
 * # Replacement semantics
 *
 * Registering a user who already has an entry replaces it and hands the old
 * entry back to the caller. Dropping the old entry closes its channel, which
 * ends the old writer task and with it the superseded socket. Unregistering
 * is guarded by the connection id, so a stale teardown from a superseded
 * connection never evicts the newer one.
 */

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::realtime::packet::Packet;
use crate::UserId;

/// A live connection handle: the connection's id plus its send endpoint.
#[derive(Debug, Clone)]
pub struct PresenceEntry {
    /// Unique id of the underlying connection
    pub conn_id: Uuid,
    /// Send endpoint feeding the connection's writer task
    pub tx: UnboundedSender<Packet>,
}

/// Registry of currently connected users.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    inner: Mutex<HashMap<UserId, PresenceEntry>>,
}

/// Locked view of the registry, held across a delivery step.
pub struct PresenceGuard<'a> {
    map: MutexGuard<'a, HashMap<UserId, PresenceEntry>>,
}

impl PresenceGuard<'_> {
    /// Look up the send endpoint for a user, if connected.
    pub fn sender(&self, user_id: UserId) -> Option<&UnboundedSender<Packet>> {
        self.map.get(&user_id).map(|entry| &entry.tx)
    }

    /// Number of connected users.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no user is connected.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection for `user_id`, replacing any prior entry.
    ///
    /// Returns the superseded entry, if any; the caller drops it to close
    /// the old connection.
    pub async fn register(&self, user_id: UserId, entry: PresenceEntry) -> Option<PresenceEntry> {
        let mut map = self.inner.lock().await;
        let replaced = map.insert(user_id, entry);
        if replaced.is_some() {
            tracing::info!("[Presence] Superseding existing connection for user {}", user_id);
        }
        replaced
    }

    /// Remove the entry for `user_id` only if it still belongs to `conn_id`.
    ///
    /// Returns true if an entry was removed. A mismatched `conn_id` means a
    /// newer connection has taken over and the call is a no-op.
    pub async fn unregister(&self, user_id: UserId, conn_id: Uuid) -> bool {
        let mut map = self.inner.lock().await;
        match map.get(&user_id) {
            Some(entry) if entry.conn_id == conn_id => {
                map.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    /// Look up the send endpoint for a user, if connected.
    pub async fn lookup(&self, user_id: UserId) -> Option<UnboundedSender<Packet>> {
        let map = self.inner.lock().await;
        map.get(&user_id).map(|entry| entry.tx.clone())
    }

    /// Acquire the registry lock for a multi-lookup delivery step.
    ///
    /// The dispatcher holds this guard across its lookup-and-deliver loop so
    /// that disconnects cannot interleave with delivery, and two dispatches
    /// cannot interleave their chat-list pushes to the same connection.
    pub async fn lock(&self) -> PresenceGuard<'_> {
        PresenceGuard {
            map: self.inner.lock().await,
        }
    }
}
