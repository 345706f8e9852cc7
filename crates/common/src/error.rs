//! Error types for atelier.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::envelope::{self, Envelope, LocalizedText, ResponseStatus};

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Validation error: {0}")]
    Validation(String),

    /// A live (pending or approved) request already exists; carries it as JSON.
    #[error("Duplicate request")]
    DuplicateRequest { existing: Value },

    #[error("Request not found: {0}")]
    RequestNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The request already left `pending`; carries the terminal status.
    #[error("Request already processed: {status}")]
    AlreadyProcessed { status: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Permission denied: {}", .0.en)]
    PermissionDenied(LocalizedText),

    #[error("Not a collaborator")]
    NotACollaborator,

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::Validation(_) | Self::DuplicateRequest { .. } | Self::AlreadyProcessed { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::RequestNotFound(_) | Self::AccountNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) | Self::NotACollaborator => StatusCode::FORBIDDEN,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the stable error type token for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::DuplicateRequest { .. } => "DuplicateRequest",
            Self::RequestNotFound(_) | Self::AccountNotFound(_) => "NotFound",
            Self::AlreadyProcessed { .. } => "AlreadyProcessed",
            Self::Unauthorized => "Unauthorized",
            Self::PermissionDenied(_) => "PermissionDenied",
            Self::NotACollaborator => "NotACollaborator",
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => "ServerError",
        }
    }

    /// Returns the localized message for this error.
    #[must_use]
    pub fn localized(&self) -> LocalizedText {
        match self {
            Self::Validation(detail) => LocalizedText::new(
                format!("Dữ liệu không hợp lệ: {detail}"),
                format!("Invalid input: {detail}"),
            ),
            Self::DuplicateRequest { .. } => LocalizedText::new(
                "Bạn đã gửi yêu cầu trước đó",
                "You have already submitted a request",
            ),
            Self::RequestNotFound(_) => {
                LocalizedText::new("Không tìm thấy yêu cầu", "Request not found")
            }
            Self::AccountNotFound(_) => {
                LocalizedText::new("Không tìm thấy người dùng", "Account not found")
            }
            Self::AlreadyProcessed { .. } => LocalizedText::new(
                "Yêu cầu đã được xử lý trước đó",
                "Request has already been processed",
            ),
            Self::Unauthorized => LocalizedText::new(
                "Vui lòng đăng nhập để tiếp tục",
                "Please sign in to continue",
            ),
            Self::PermissionDenied(message) => message.clone(),
            Self::NotACollaborator => LocalizedText::new(
                "Bạn không phải là cộng tác viên",
                "You are not a collaborator",
            ),
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => LocalizedText::new(
                "Đã xảy ra lỗi khi xử lý yêu cầu",
                "An error occurred while processing your request",
            ),
        }
    }

    /// Returns the envelope outcome token for this error.
    #[must_use]
    pub const fn response_status(&self) -> ResponseStatus {
        match self {
            Self::Validation(_) => ResponseStatus::Fail,
            _ => ResponseStatus::Error,
        }
    }

    /// Returns the payload attached to the error response, if any.
    #[must_use]
    pub fn data(&self) -> Option<Value> {
        match self {
            Self::DuplicateRequest { existing } => Some(json!({ "request": existing })),
            Self::AlreadyProcessed { status } => Some(json!({ "status": status })),
            Self::Database(detail) | Self::Config(detail) | Self::Internal(detail)
                if envelope::expose_internal_errors() =>
            {
                Some(json!({ "error": detail }))
            }
            _ => None,
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Build the envelope for this error.
    #[must_use]
    pub fn to_envelope(&self) -> Envelope<Value> {
        Envelope::failure(
            self.response_status(),
            self.localized(),
            self.error_code(),
            self.status_code().as_u16(),
            self.data(),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        (status, Json(self.to_envelope())).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
