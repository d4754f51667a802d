/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * `FromRef` so axum handlers can extract the part of the state they need.
 *
 * # Thread Safety
 *
 * - `PgPool` is internally shared and clone-cheap
 * - `Arc<PresenceRegistry>` serializes its own mutation internally
 * - `mpsc::Sender` is the producer side of the bounded dispatch queue;
 *   cloning it is how each connection's read loop submits packets
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::realtime::packet::InboundMessage;
use crate::realtime::presence::PresenceRegistry;

/// Central state container for the axum application
///
/// # Fields
///
/// * `db` - PostgreSQL connection pool (mandatory; every operation is
///   storage-backed)
/// * `presence` - the live-connection registry
/// * `inbound_tx` - producer side of the bounded queue drained by the
///   dispatcher; sending blocks when the queue is full, which is the
///   system's backpressure
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Live-connection registry
    pub presence: Arc<PresenceRegistry>,
    /// Producer handle for the dispatch queue
    pub inbound_tx: mpsc::Sender<InboundMessage>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db.clone()
    }
}

impl FromRef<AppState> for Arc<PresenceRegistry> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.presence.clone()
    }
}

impl FromRef<AppState> for mpsc::Sender<InboundMessage> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.inbound_tx.clone()
    }
}
