//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::ApiResponse;
use crate::services::ServiceError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A service rejected the operation.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Bad request from client (unparseable form field, bad path id).
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Service(err) => match err {
                ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                ServiceError::Conflict => StatusCode::CONFLICT,
                ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::PasswordHash | ServiceError::Entropy(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Service(err) => match err {
                ServiceError::InvalidInput(msg) => msg.clone(),
                ServiceError::Conflict => "User already exists".to_string(),
                ServiceError::Unauthorized => "Unauthorized".to_string(),
                ServiceError::NotFound(what) => format!("Not found: {what}"),
                // Don't expose internal error details to clients
                ServiceError::PasswordHash | ServiceError::Entropy(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(&self, Self::Service(err) if err.is_internal()) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        ApiResponse::error(self.status(), self.client_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a username.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(username: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            username: Some(username.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    sentry::add_breadcrumb(breadcrumb(category, message, data));
}

fn breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) -> sentry::Breadcrumb {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            sentry::protocol::Value::String((*value).to_string()),
        );
    }

    breadcrumb
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid product id".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid product id");

        let err = AppError::from(ServiceError::NotFound("product 3".to_string()));
        assert_eq!(err.to_string(), "not found: product 3");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(ServiceError::InvalidInput("short".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(ServiceError::Conflict), StatusCode::CONFLICT);
        assert_eq!(
            get_status(ServiceError::Unauthorized),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(ServiceError::NotFound("product 9".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ServiceError::PasswordHash),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(ServiceError::Entropy("device unavailable".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::from(ServiceError::Entropy("getrandom: EIO".to_string()));
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_error_body_is_json_envelope() {
        let response = AppError::from(ServiceError::Unauthorized).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Unauthorized");
    }

    #[test]
    fn test_breadcrumb_carries_data() {
        let crumb = breadcrumb("cart", "Checkout", &[("total", "25.50")]);
        assert_eq!(crumb.category.as_deref(), Some("cart"));
        assert_eq!(crumb.message.as_deref(), Some("Checkout"));
        assert_eq!(crumb.level, sentry::Level::Info);
        assert_eq!(crumb.data.get("total").unwrap(), "25.50");
    }
}
