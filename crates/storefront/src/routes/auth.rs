//! Authentication route handlers.
//!
//! Register, login and logout over form posts, plus a protected endpoint that
//! reports who the caller is.

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use tracing::instrument;

use crate::error::{self, AppError, Result};
use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::{RequestCredentials, clear_auth_cookies, set_auth_cookies};
use crate::response::ApiResponse;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Register and login form data.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn form<T>(payload: std::result::Result<Form<T>, FormRejection>) -> Result<T> {
    payload
        .map(|Form(inner)| inner)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct RegisteredView {
    pub username: String,
}

/// Returned on login.
///
/// Carries the CSRF token so non-browser clients can echo it without
/// parsing cookies. The session token is only ever sent as a cookie.
#[derive(Debug, Serialize)]
pub struct LoginView {
    pub username: String,
    pub csrf_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct WhoAmIView {
    pub username: String,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Register a new user.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Form<CredentialsForm>, FormRejection>,
) -> Result<impl IntoResponse> {
    let form = form(payload)?;
    let username = state
        .sessions()
        .register(&form.username, &form.password)
        .await?;

    Ok(ApiResponse::ok(RegisteredView {
        username: username.into_inner(),
    })
    .with_message("User registered successfully")
    .with_status(StatusCode::CREATED))
}

/// Authenticate and set the auth cookies.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    payload: std::result::Result<Form<CredentialsForm>, FormRejection>,
) -> Result<impl IntoResponse> {
    let form = form(payload)?;
    let issued = state.sessions().login(&form.username, &form.password).await?;

    set_auth_cookies(
        &cookies,
        &issued,
        state.sessions().ttl(),
        state.config().cookie_secure,
    );
    error::set_sentry_user(&issued.username);
    error::add_breadcrumb("auth", "Login", &[]);

    Ok(ApiResponse::ok(LoginView {
        username: issued.username.to_string(),
        csrf_token: issued.csrf_token.expose().to_owned(),
        expires_at: issued.expires_at,
    })
    .with_message("Login successful"))
}

/// End the caller's session and expire the auth cookies.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<impl IntoResponse> {
    let session_token = cookies
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .unwrap_or_default();

    state.sessions().logout(&session_token).await?;

    clear_auth_cookies(&cookies, state.config().cookie_secure);
    error::add_breadcrumb("auth", "Logout", &[]);
    error::clear_sentry_user();

    Ok(ApiResponse::message("Logout successful"))
}

/// Echo the authenticated user.
#[instrument(skip_all)]
pub async fn protected(
    State(state): State<AppState>,
    RequestCredentials(credentials): RequestCredentials,
) -> Result<impl IntoResponse> {
    let auth = state.gate().check(&credentials).await?;

    Ok(ApiResponse::ok(WhoAmIView {
        username: auth.username().to_string(),
    })
    .with_message("Access granted"))
}
