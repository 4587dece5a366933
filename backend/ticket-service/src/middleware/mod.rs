/// HTTP middleware for ticket-service
pub mod auth;

pub use auth::{AuthUser, Claims, JwtAuthMiddleware, JwtKeys};
