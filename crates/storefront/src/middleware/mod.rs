//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Cookie manager (`tower-cookies` jar for the auth cookies)
//! 5. Security headers

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequestCredentials, clear_auth_cookies, set_auth_cookies};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
