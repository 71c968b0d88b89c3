//! Credential extraction and auth cookie helpers.
//!
//! Login delivers three cookies:
//!
//! | Cookie          | `HttpOnly` | Read by          |
//! |-----------------|------------|------------------|
//! | `session_token` | yes        | server only      |
//! | `csrf_token`    | no         | client script    |
//! | `username`      | yes        | server only      |
//!
//! Client script copies `csrf_token` into the `X-CSRF-Token` header of every
//! protected request.
//!
//! Values are percent-encoded when set, since a username may contain `;`, `,`
//! or spaces. `CookieManagerLayer` decodes them again when parsing requests.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use chrono::TimeDelta;
use tower_cookies::{
    Cookie, Cookies,
    cookie::{SameSite, time::Duration},
};

use crate::services::auth::{Credentials, IssuedSession};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session_token";
/// Cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "csrf_token";
/// Cookie carrying the username.
pub const USERNAME_COOKIE: &str = "username";
/// Header a protected request must echo the CSRF token in.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Extractor for the unvalidated credentials of a request.
///
/// Never rejects on missing values; the authorization gate decides.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     State(state): State<AppState>,
///     RequestCredentials(credentials): RequestCredentials,
/// ) -> Result<impl IntoResponse> {
///     let auth = state.gate().check(&credentials).await?;
///     // ...
/// }
/// ```
pub struct RequestCredentials(pub Credentials);

impl<S> FromRequestParts<S> for RequestCredentials
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let cookie_value = |name: &str| cookies.get(name).map(|c| c.value().to_owned());

        let csrf_token = parts
            .headers
            .get(CSRF_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(String::from);

        Ok(Self(Credentials {
            username: cookie_value(USERNAME_COOKIE),
            session_token: cookie_value(SESSION_COOKIE),
            csrf_token,
        }))
    }
}

fn auth_cookie(name: &'static str, value: String, http_only: bool, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(http_only);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie
}

/// Deliver a freshly issued session as the three auth cookies.
pub fn set_auth_cookies(cookies: &Cookies, issued: &IssuedSession, ttl: TimeDelta, secure: bool) {
    let max_age = Duration::seconds(ttl.num_seconds());

    let values = [
        (SESSION_COOKIE, issued.session_token.expose().to_owned(), true),
        (CSRF_COOKIE, issued.csrf_token.expose().to_owned(), false),
        (USERNAME_COOKIE, issued.username.to_string(), true),
    ];

    for (name, value, http_only) in values {
        let value = urlencoding::encode(&value).into_owned();
        let mut cookie = auth_cookie(name, value, http_only, secure);
        cookie.set_max_age(max_age);
        cookies.add(cookie);
    }
}

/// Expire all three auth cookies on the client.
pub fn clear_auth_cookies(cookies: &Cookies, secure: bool) {
    for (name, http_only) in [
        (SESSION_COOKIE, true),
        (CSRF_COOKIE, false),
        (USERNAME_COOKIE, true),
    ] {
        let mut cookie = auth_cookie(name, String::new(), http_only, secure);
        cookie.set_max_age(Duration::ZERO);
        cookies.add(cookie);
    }
}
