//! Session lifecycle: register, login, logout and expiry.
//!
//! ```text
//! LoggedOut --register--> LoggedOut --login--> LoggedIn --logout--> LoggedOut
//!                                              LoggedIn --login---> LoggedIn (tokens rotated)
//! ```
//!
//! Every login issues a fresh token pair. Rotating or clearing a session
//! also drops the cart keyed by the old session token, while the credential
//! write guard is still held.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::instrument;

use urbancart_core::{CsrfToken, SessionToken, Username};

use super::credentials::{ActiveSession, CredentialStore};
use super::token::TokenIssuer;
use crate::services::ServiceError;
use crate::services::cart::CartStore;

/// Credentials handed back to the caller after a successful login.
///
/// The caller is responsible for delivering them as cookies: the session
/// token `HttpOnly`, the CSRF token readable by client script.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub username: Username,
    pub session_token: SessionToken,
    pub csrf_token: CsrfToken,
    pub expires_at: DateTime<Utc>,
}

/// Orchestrates the credential store, token issuer and cart store.
#[derive(Debug)]
pub struct SessionManager {
    credentials: Arc<CredentialStore>,
    carts: Arc<CartStore>,
    tokens: TokenIssuer,
    ttl: TimeDelta,
}

impl SessionManager {
    /// Create a session manager whose sessions live for `ttl`.
    #[must_use]
    pub const fn new(
        credentials: Arc<CredentialStore>,
        carts: Arc<CartStore>,
        tokens: TokenIssuer,
        ttl: TimeDelta,
    ) -> Self {
        Self {
            credentials,
            carts,
            tokens,
            ttl,
        }
    }

    /// Lifetime of newly issued sessions.
    #[must_use]
    pub const fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Register a new, logged-out user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for short fields and
    /// `ServiceError::Conflict` for a taken username.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<Username, ServiceError> {
        let username = self.credentials.register(username, password).await?;
        tracing::info!(username = %username, "user registered");
        Ok(username)
    }

    /// Authenticate and issue a fresh session/CSRF token pair.
    ///
    /// Any previous session of the same user stops validating immediately
    /// and its cart is dropped.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthorized` for an unknown username or a
    /// wrong password, without saying which. Returns
    /// `ServiceError::Entropy` if tokens cannot be generated.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, ServiceError> {
        if !self.credentials.verify_password(username, password).await {
            tracing::warn!("login rejected");
            return Err(ServiceError::Unauthorized);
        }

        let (session_token, csrf_token) = self.tokens.session_pair()?;
        let issued_at = Utc::now();
        let expires_at = issued_at + self.ttl;

        let mut users = self.credentials.write().await;
        let previous = users.set_tokens(
            username,
            ActiveSession {
                session_token: session_token.clone(),
                csrf_token: csrf_token.clone(),
                issued_at,
                expires_at,
            },
        )?;
        let username = users
            .get(username)
            .map(|r| r.username.clone())
            .ok_or(ServiceError::Unauthorized)?;

        if let Some(previous) = previous {
            self.carts.drop_cart(previous.expose()).await;
            tracing::info!(username = %username, "previous session rotated out");
        }
        drop(users);

        tracing::info!(username = %username, %expires_at, "session issued");

        Ok(IssuedSession {
            username,
            session_token,
            csrf_token,
            expires_at,
        })
    }

    /// End the session identified by `session_token` and drop its cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Unauthorized` if no user holds the token.
    #[instrument(skip_all)]
    pub async fn logout(&self, session_token: &str) -> Result<Username, ServiceError> {
        if session_token.is_empty() {
            return Err(ServiceError::Unauthorized);
        }

        let mut users = self.credentials.write().await;
        let username = users
            .find_by_session_token(session_token)
            .map(|r| r.username.clone())
            .ok_or(ServiceError::Unauthorized)?;

        users.clear_tokens(username.as_str());
        self.carts.drop_cart(session_token).await;
        drop(users);

        tracing::info!(username = %username, "session ended");
        Ok(username)
    }

    /// Clear every expired session and drop its cart.
    ///
    /// Returns the number of sessions removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let mut users = self.credentials.write().await;

        let mut swept = 0;
        for username in users.expired(now) {
            if let Some(ended) = users.clear_tokens(username.as_str()) {
                self.carts.drop_cart(ended.session_token.expose()).await;
                swept += 1;
            }
        }
        drop(users);

        if swept > 0 {
            tracing::info!(swept, "expired sessions removed");
        }
        swept
    }
}
