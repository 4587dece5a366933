//! Ticket Service
//!
//! Support-ticket collaboration backend: per-ticket realtime chat, threaded
//! comments, attachments, and best-effort email notifications on activity.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;
pub mod store;
pub mod websocket;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
