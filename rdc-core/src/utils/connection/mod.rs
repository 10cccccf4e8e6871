//! Module Exports
//!
//! # Modules
//! - `server`: WebSocket endpoint that feeds operator input and lifecycle
//!   requests into the controllers.

/// Operator WebSocket server.
pub mod server;
