//! Shared error envelope for every HTTP-facing service in the workspace.
//!
//! Services keep their own domain error enums and render them through
//! [`ErrorResponse`] so clients see one JSON shape regardless of origin.

use serde::{Deserialize, Serialize};

/// Unified API error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP reason phrase, e.g. "Not Found"
    pub error: String,

    /// Human readable message
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Coarse error category used by clients for routing.
    /// One of the constants in [`error_types`].
    pub error_type: String,

    /// Stable machine code, see [`error_codes`]
    pub code: String,

    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Stable error codes, grouped by resource.
pub mod error_codes {
    // Users / auth
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";

    // Tickets
    pub const TICKET_NOT_FOUND: &str = "TICKET_NOT_FOUND";
    pub const COMMENT_NOT_FOUND: &str = "COMMENT_NOT_FOUND";
    pub const MESSAGE_NOT_FOUND: &str = "MESSAGE_NOT_FOUND";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";

    // Attachments
    pub const UPLOAD_FAILED: &str = "UPLOAD_FAILED";

    // Infrastructure
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const MAIL_ERROR: &str = "MAIL_ERROR";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}

/// Error categories carried in [`ErrorResponse::error_type`].
pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";
    pub const NOT_FOUND_ERROR: &str = "not_found_error";
    pub const SERVER_ERROR: &str = "server_error";
}
