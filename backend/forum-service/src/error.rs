/// Error types for Forum Service
///
/// Every failure a handler can produce is an `AppError`. Errors are converted
/// to JSON HTTP responses of the form `{"error": ..., "status": ...}`.
use crate::db::comment_repo::TreeError;
use crate::db::vote_repo::VoteLedgerError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for forum-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request body or parameters are malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Content was flagged by the moderation gate
    #[error("Your content was flagged as '{label}'. Please revise it and try again.")]
    ModerationRejected { label: String },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated actor may not touch this resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_side(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_)
        )
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) | AppError::ModerationRejected { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Internal details stay in the logs.
        let error_msg = if self.is_server_side() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<TreeError> for AppError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::NoSuchPost(_) => AppError::NotFound(err.to_string()),
            TreeError::NoSuchParent(_)
            | TreeError::ParentOnDifferentPost { .. }
            | TreeError::TooDeep { .. } => {
                AppError::Validation(err.to_string())
            }
            TreeError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<VoteLedgerError> for AppError {
    fn from(err: VoteLedgerError) -> Self {
        match err {
            VoteLedgerError::NoSuchPost(_) => AppError::NotFound(err.to_string()),
            VoteLedgerError::Contention | VoteLedgerError::CorruptValue(_) => {
                AppError::Internal(err.to_string())
            }
            VoteLedgerError::Database(e) => AppError::Database(e),
        }
    }
}
