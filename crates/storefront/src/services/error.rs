//! Service error taxonomy.

use thiserror::Error;

/// Errors returned by the core services.
///
/// `Unauthorized` is deliberately undifferentiated: it never says whether a
/// username, password, session token or CSRF token was the thing that failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or out-of-range request field.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Username already registered.
    #[error("user already exists")]
    Conflict,

    /// Any authentication or authorization failure.
    #[error("unauthorized")]
    Unauthorized,

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,

    /// The OS random source failed; no token was issued.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
}

impl ServiceError {
    /// Returns `true` for failures caused by the server rather than the request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::PasswordHash | Self::Entropy(_))
    }
}
