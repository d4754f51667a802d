/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including state creation, database loading, and route configuration.
 *
 * # Initialization Process
 *
 * 1. Load the database (mandatory, migrations run here)
 * 2. Create the presence registry and the inbound message queue
 * 3. Spawn the dispatcher task (sole consumer of the queue)
 * 4. Spawn the periodic session-pruning task
 * 5. Create and configure the router
 */

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::mpsc;

use crate::auth::sessions;
use crate::realtime::dispatcher;
use crate::realtime::{InboundMessage, PresenceRegistry, QUEUE_CAPACITY};
use crate::routes::create_router;
use crate::server::config::load_database;
use crate::server::state::AppState;

/// How often expired session rows are reclaimed
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Create and configure the Axum application
///
/// Sets up everything the server needs: the database connection pool, the
/// presence registry shared between connection tasks and the dispatcher,
/// the bounded inbound queue, and the dispatcher task itself.
///
/// # Errors
///
/// Startup is all-or-nothing: any database error (missing `DATABASE_URL`,
/// connection failure, migration failure) aborts initialization.
pub async fn create_app() -> Result<Router<()>, sqlx::Error> {
    tracing::info!("[Server] Initializing courier backend server");

    let db = load_database().await?;

    let presence = Arc::new(PresenceRegistry::new());

    // Single-consumer persistence and fan-out pipeline. Every connection
    // task produces into this queue; the dispatcher alone drains it.
    let (inbound_tx, inbound_rx) = mpsc::channel::<InboundMessage>(QUEUE_CAPACITY);
    tokio::spawn(dispatcher::run(db.clone(), Arc::clone(&presence), inbound_rx));

    // Expired tokens already fail authentication; this reclaims the rows.
    {
        let db = db.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                match sessions::prune_expired(&db).await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!("[Server] Pruned {} expired sessions", n),
                    Err(e) => tracing::warn!("[Server] Session pruning failed: {}", e),
                }
            }
        });
    }

    tracing::info!("[Server] Presence registry and dispatcher initialized");

    let state = AppState {
        db,
        presence,
        inbound_tx,
    };

    Ok(create_router(state))
}
