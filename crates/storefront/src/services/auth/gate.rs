//! Authorization gate for protected operations.
//!
//! Implements the double-submit cookie pattern: the session token arrives in
//! an `HttpOnly` cookie that browsers attach automatically, while the CSRF
//! token must be read by client script and echoed in a header. A forged
//! cross-site request carries the cookie but cannot supply the header.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tokio::sync::RwLockReadGuard;

use urbancart_core::Username;

use super::credentials::{CredentialStore, Users};
use crate::services::ServiceError;

/// Credentials extracted from a request, before validation.
///
/// Empty strings are treated the same as missing values.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub session_token: Option<String>,
    pub csrf_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Proof that a request passed the gate.
///
/// Holds a shared guard on the credential store, so the session cannot be
/// logged out or rotated while the protected operation runs. Drop it as
/// soon as the operation completes.
pub struct Authorized<'a> {
    _users: RwLockReadGuard<'a, Users>,
    username: Username,
    session_token: String,
}

impl Authorized<'_> {
    /// The authenticated user.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }

    /// The validated session token, used to key the user's cart.
    #[must_use]
    pub fn session_token(&self) -> &str {
        &self.session_token
    }
}

impl std::fmt::Debug for Authorized<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorized")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Validates request credentials against the credential store.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    credentials: Arc<CredentialStore>,
}

impl AuthorizationGate {
    /// Create a gate backed by `credentials`.
    #[must_use]
    pub const fn new(credentials: Arc<CredentialStore>) -> Self {
        Self { credentials }
    }

    /// Check username, session token and CSRF token together.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthorized` if any of the three is missing,
    /// empty or wrong, or if the session has expired. The error never
    /// says which check failed.
    pub async fn check(&self, credentials: &Credentials) -> Result<Authorized<'_>, ServiceError> {
        let users = self.credentials.read().await;

        let Some(username) = evaluate(&users, credentials, Utc::now()) else {
            tracing::debug!("authorization denied");
            return Err(ServiceError::Unauthorized);
        };

        let session_token = credentials.session_token.clone().unwrap_or_default();
        Ok(Authorized {
            _users: users,
            username,
            session_token,
        })
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Returns the authorized username, or `None` on any mismatch.
fn evaluate(users: &Users, credentials: &Credentials, now: DateTime<Utc>) -> Option<Username> {
    let username = non_empty(credentials.username.as_ref())?;
    let session_token = non_empty(credentials.session_token.as_ref())?;
    let csrf_token = non_empty(credentials.csrf_token.as_ref())?;

    let record = users.get(username)?;
    let active = record.session.as_ref()?;

    let session_ok = active
        .session_token
        .expose()
        .as_bytes()
        .ct_eq(session_token.as_bytes());
    let csrf_ok = active
        .csrf_token
        .expose()
        .as_bytes()
        .ct_eq(csrf_token.as_bytes());

    if bool::from(session_ok & csrf_ok) && !active.is_expired(now) {
        Some(record.username.clone())
    } else {
        None
    }
}
