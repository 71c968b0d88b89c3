//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Health check
//!
//! # Auth
//! POST   /register             - Register (form: username, password)
//! POST   /login                - Login, sets auth cookies
//! POST   /logout               - Logout, expires auth cookies
//! GET    /protected            - Echo the authenticated user
//!
//! # Products
//! GET    /products             - Product listing
//! POST   /products             - Create product (JSON)
//! GET    /products/{id}        - Product detail
//! PUT    /products/{id}        - Replace product (JSON)
//! DELETE /products/{id}        - Delete product
//!
//! # Cart (requires session cookie + X-CSRF-Token header)
//! POST   /cart/add             - Add line (form: product_id, quantity, size)
//! GET    /cart/view            - Lines and total
//! POST   /cart/remove          - Remove lines (form: product_id)
//! POST   /cart/checkout        - Total and empty the cart
//! ```

pub mod auth;
pub mod cart;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/protected", get(auth::protected))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/view", get(cart::view))
        .route("/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
}
