/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration,
 * centered on the mandatory PostgreSQL database connection.
 *
 * # Configuration Sources
 *
 * Configuration is loaded from environment variables. `DATABASE_URL` is
 * required: the server persists every message and chat, so it refuses to
 * start without storage.
 */

use sqlx::PgPool;

/// Load and initialize the database connection pool
///
/// This function:
/// 1. Reads `DATABASE_URL` from the environment
/// 2. Creates a PostgreSQL connection pool
/// 3. Runs database migrations
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset, the connection fails, or
/// migrations fail. All of these are fatal at startup.
pub async fn load_database() -> Result<PgPool, sqlx::Error> {
    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        sqlx::Error::Configuration("DATABASE_URL environment variable is not set".into())
    })?;

    tracing::info!("[Server] Connecting to database...");

    let pool = PgPool::connect(&database_url).await.map_err(|e| {
        tracing::error!("[Server] Failed to create database connection pool: {:?}", e);
        e
    })?;

    tracing::info!("[Server] Database connection pool created successfully");

    tracing::info!("[Server] Running database migrations...");
    sqlx::migrate!().run(&pool).await.map_err(|e| {
        tracing::error!("[Server] Failed to run database migrations: {:?}", e);
        sqlx::Error::Migrate(Box::new(e))
    })?;
    tracing::info!("[Server] Database migrations completed successfully");

    Ok(pool)
}

/// Read the listen port from `SERVER_PORT`, defaulting to 8080
pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080)
}
