//! Cart route handlers.
//!
//! Every handler runs the authorization gate first and keeps the resulting
//! proof alive until the cart operation returns.

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use urbancart_core::Price;

use crate::error::{self, AppError, Result};
use crate::middleware::RequestCredentials;
use crate::response::ApiResponse;
use crate::routes::products::parse_product_id;
use crate::services::cart::{CartItem, CartSummary};
use crate::state::AppState;

/// Add to cart form data.
///
/// Fields arrive as strings so parse failures map to a 400 envelope.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub size: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    #[serde(default)]
    pub product_id: String,
}

fn form<T>(payload: std::result::Result<Form<T>, FormRejection>) -> Result<T> {
    payload
        .map(|Form(inner)| inner)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Decimal,
    pub formatted_total: String,
    pub empty: bool,
}

impl CartView {
    fn new(summary: CartSummary, state: &AppState) -> Self {
        let empty = summary.is_empty();
        Self {
            formatted_total: format_total(summary.total, state),
            items: summary.items,
            total: summary.total,
            empty,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub total: Decimal,
    pub formatted_total: String,
}

fn format_total(total: Decimal, state: &AppState) -> String {
    Price::new(total, state.config().currency).to_string()
}

/// Add a line to the caller's cart.
#[instrument(skip_all)]
pub async fn add(
    State(state): State<AppState>,
    RequestCredentials(credentials): RequestCredentials,
    payload: std::result::Result<Form<AddToCartForm>, FormRejection>,
) -> Result<impl IntoResponse> {
    let auth = state.gate().check(&credentials).await?;
    let form = form(payload)?;

    let product_id = parse_product_id(&form.product_id)?;
    let quantity = form
        .quantity
        .trim()
        .parse::<i32>()
        .map_err(|_| AppError::BadRequest("Invalid quantity".to_string()))?;

    let item = state
        .carts()
        .add(&auth, product_id, quantity, form.size.trim())
        .await?;

    Ok(ApiResponse::ok(item).with_message("Product added to cart"))
}

/// Show the caller's cart and its total.
#[instrument(skip_all)]
pub async fn view(
    State(state): State<AppState>,
    RequestCredentials(credentials): RequestCredentials,
) -> Result<impl IntoResponse> {
    let auth = state.gate().check(&credentials).await?;
    let summary = state.carts().view(&auth).await;
    drop(auth);

    let message = if summary.is_empty() {
        "Cart is empty"
    } else {
        "Cart retrieved"
    };
    Ok(ApiResponse::ok(CartView::new(summary, &state)).with_message(message))
}

/// Remove every line for a product.
#[instrument(skip_all)]
pub async fn remove(
    State(state): State<AppState>,
    RequestCredentials(credentials): RequestCredentials,
    payload: std::result::Result<Form<RemoveFromCartForm>, FormRejection>,
) -> Result<impl IntoResponse> {
    let auth = state.gate().check(&credentials).await?;
    let form = form(payload)?;
    let product_id = parse_product_id(&form.product_id)?;

    let removed = state.carts().remove(&auth, product_id).await;
    tracing::debug!(%product_id, removed, "cart lines removed");

    Ok(ApiResponse::message("Product removed from cart"))
}

/// Total the cart and empty it.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    RequestCredentials(credentials): RequestCredentials,
) -> Result<impl IntoResponse> {
    let auth = state.gate().check(&credentials).await?;
    let total = state.carts().checkout(&auth).await?;
    drop(auth);

    let amount = total.to_string();
    error::add_breadcrumb("cart", "Checkout", &[("total", amount.as_str())]);

    Ok(ApiResponse::ok(CheckoutView {
        total,
        formatted_total: format_total(total, &state),
    })
    .with_message("Checkout completed"))
}
