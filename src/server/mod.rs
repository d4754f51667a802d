//! Server Module
//!
//! This module contains all server-side code for initializing and configuring
//! the Axum HTTP server. It provides the foundation for the application's
//! backend infrastructure.
//!
//! # Architecture
//!
//! The server module is organized into focused submodules:
//!
//! - **`state`** - Application state structure and `FromRef` implementations
//! - **`config`** - Configuration loading and validation
//! - **`init`** - Server initialization and app creation
//!
//! # State Management
//!
//! The server uses `AppState` as the central state container, which holds:
//! - The PostgreSQL connection pool
//! - The presence registry shared with the dispatcher
//! - The producer side of the inbound message queue
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: Connects to the database and runs migrations
//! 2. **State Creation**: Creates the presence registry and inbound queue
//! 3. **Background Tasks**: Spawns the dispatcher task
//! 4. **Router Creation**: Configures all routes

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

// Re-export commonly used types
pub use init::create_app;
pub use state::AppState;
