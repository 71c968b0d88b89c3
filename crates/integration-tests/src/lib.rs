//! Integration tests for UrbanCart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p urbancart-integration-tests
//! ```
//!
//! Tests drive the complete storefront router in-process with
//! `tower::ServiceExt::oneshot`; no server or network is needed.
//!
//! # Test Categories
//!
//! - `auth_flow` - register, login cookies, logout, CSRF enforcement
//! - `cart_flow` - cart operations behind the authorization gate
//! - `products_api` - catalog CRUD

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use urbancart_storefront::app;
use urbancart_storefront::config::StorefrontConfig;
use urbancart_storefront::services::auth::{HashCost, TokenIssuer};
use urbancart_storefront::state::AppState;

/// Password used by [`TestApp::login_new_user`].
pub const PASSWORD: &str = "validpass";

/// An in-process storefront.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// All `Set-Cookie` header values.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect()
    }

    /// The full `Set-Cookie` line for `name`.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.set_cookies().into_iter().find(|c| c.starts_with(&prefix))
    }

    /// The value `Set-Cookie` assigns to `name`.
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        let line = self.set_cookie(name)?;
        let pair = line.split(';').next()?;
        pair.split_once('=').map(|(_, v)| v.to_string())
    }

    /// `body.message` as a string.
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// What a browser holds after logging in.
///
/// Values are kept exactly as received in `Set-Cookie`.
#[derive(Debug, Clone)]
pub struct BrowserSession {
    pub username: String,
    pub session_token: String,
    pub csrf_token: String,
}

impl BrowserSession {
    /// The `Cookie` header a browser would send.
    pub fn cookie_header(&self) -> String {
        format!(
            "session_token={}; csrf_token={}; username={}",
            self.session_token, self.csrf_token, self.username
        )
    }
}

fn credentials_form(username: &str, password: &str) -> String {
    format!(
        "username={}&password={}",
        urlencoding::encode(username),
        urlencoding::encode(password)
    )
}

impl TestApp {
    /// Storefront with default configuration and a fast password hash.
    pub fn new() -> Self {
        Self::with_token_issuer(TokenIssuer::default())
    }

    /// Storefront whose session tokens come from `tokens`.
    pub fn with_token_issuer(tokens: TokenIssuer) -> Self {
        let config = StorefrontConfig {
            password_cost: HashCost::new(8, 1),
            ..StorefrontConfig::default()
        };
        let state = AppState::with_token_issuer(config, tokens).unwrap();
        let router = app(state.clone());
        Self { state, router }
    }

    /// Send a request through the full middleware stack.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// POST a urlencoded form, optionally as a logged-in browser.
    pub async fn post_form(
        &self,
        uri: &str,
        form: &str,
        session: Option<&BrowserSession>,
    ) -> TestResponse {
        let mut builder = Request::post(uri).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        if let Some(session) = session {
            builder = builder
                .header(header::COOKIE, session.cookie_header())
                .header("x-csrf-token", &session.csrf_token);
        }
        self.send(builder.body(Body::from(form.to_owned())).unwrap())
            .await
    }

    /// GET as a logged-in browser.
    pub async fn get_as(&self, uri: &str, session: &BrowserSession) -> TestResponse {
        let request = Request::get(uri)
            .header(header::COOKIE, session.cookie_header())
            .header("x-csrf-token", &session.csrf_token)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a JSON body.
    pub async fn send_json(&self, method: Method, uri: &str, body: &Value) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn register(&self, username: &str, password: &str) -> TestResponse {
        self.post_form(
            "/register",
            &credentials_form(username, password),
            None,
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post_form(
            "/login",
            &credentials_form(username, password),
            None,
        )
        .await
    }

    /// Register `username`, log in and capture the issued cookies.
    pub async fn login_new_user(&self, username: &str) -> BrowserSession {
        assert_eq!(
            self.register(username, PASSWORD).await.status,
            StatusCode::CREATED
        );
        let response = self.login(username, PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK);

        BrowserSession {
            username: response.cookie_value("username").unwrap(),
            session_token: response.cookie_value("session_token").unwrap(),
            csrf_token: response.cookie_value("csrf_token").unwrap(),
        }
    }

    /// Create a product and return its id.
    pub async fn create_product(&self, name: &str, price: &str) -> i64 {
        let response = self
            .send_json(
                Method::POST,
                "/products",
                &serde_json::json!({
                    "name": name,
                    "price": price,
                    "sizes": ["P", "M", "G"],
                    "stock_quantity": 10,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["data"]["id"].as_i64().unwrap()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
