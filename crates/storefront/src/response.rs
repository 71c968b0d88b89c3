//! JSON response envelope shared by every route.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Outcome marker in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{ "status": ..., "message": ..., "data": ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize = ()> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip)]
    code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// A 200 response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            status: Status::Success,
            message: None,
            data: Some(data),
            code: StatusCode::OK,
        }
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Override the HTTP status code.
    #[must_use]
    pub const fn with_status(mut self, code: StatusCode) -> Self {
        self.code = code;
        self
    }
}

impl ApiResponse {
    /// A 200 response with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: Some(message.into()),
            data: None,
            code: StatusCode::OK,
        }
    }

    /// An error envelope with the given status code.
    pub fn error(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            data: None,
            code,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let code = self.code;
        (code, Json(self)).into_response()
    }
}
