//! API response types.

use atelier_common::{Envelope, LocalizedText};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope paired with its HTTP status.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    status: StatusCode,
    envelope: Envelope<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a 200 response.
    pub fn ok(message: LocalizedText, data: T) -> Self {
        Self {
            status: StatusCode::OK,
            envelope: Envelope::success(message, Some(data)),
        }
    }

    /// Create a 201 response.
    pub fn created(message: LocalizedText, data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            envelope: Envelope::success(message, Some(data)),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}
