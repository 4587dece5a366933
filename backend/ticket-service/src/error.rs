/// Error types for the ticket service
///
/// Every fallible operation in the crate returns [`AppError`]. Handlers rely on
/// the [`ResponseError`] impl to render the shared JSON error envelope.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use error_types::{error_codes, error_types as kinds, ErrorResponse};
use thiserror::Error;

/// Result type for ticket-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("attachment storage error: {0}")]
    Storage(String),

    #[error("mail error: {0}")]
    Mail(String),
}

impl AppError {
    fn kind_and_code(&self) -> (&'static str, &'static str) {
        match self {
            AppError::BadRequest(_) => (kinds::VALIDATION_ERROR, error_codes::INVALID_REQUEST),
            AppError::Unauthorized(_) => (
                kinds::AUTHENTICATION_ERROR,
                error_codes::INVALID_CREDENTIALS,
            ),
            AppError::NotFound(resource) => (
                kinds::NOT_FOUND_ERROR,
                match *resource {
                    "ticket" => error_codes::TICKET_NOT_FOUND,
                    "comment" => error_codes::COMMENT_NOT_FOUND,
                    "message" => error_codes::MESSAGE_NOT_FOUND,
                    _ => error_codes::USER_NOT_FOUND,
                },
            ),
            AppError::Database(_) => (kinds::SERVER_ERROR, error_codes::DATABASE_ERROR),
            AppError::Storage(_) => (kinds::VALIDATION_ERROR, error_codes::UPLOAD_FAILED),
            AppError::Mail(_) => (kinds::SERVER_ERROR, error_codes::MAIL_ERROR),
            AppError::Config(_) => (kinds::SERVER_ERROR, error_codes::CONFIG_ERROR),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Storage(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Mail(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error_type, code) = self.kind_and_code();

        // Internal details stay in the logs.
        let message = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "database error".to_string()
            }
            other => other.to_string(),
        };

        let response = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            &message,
            status.as_u16(),
            error_type,
            code,
        );

        HttpResponse::build(status).json(response)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
