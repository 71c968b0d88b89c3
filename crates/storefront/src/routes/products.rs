//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use urbancart_core::ProductId;

use crate::error::{AppError, Result};
use crate::response::ApiResponse;
use crate::services::catalog::NewProduct;
use crate::state::AppState;

/// Parse a path segment into a product id.
pub(crate) fn parse_product_id(raw: &str) -> Result<ProductId> {
    raw.trim()
        .parse::<i32>()
        .map(ProductId::new)
        .map_err(|_| AppError::BadRequest("Invalid product ID".to_string()))
}

fn json_body(payload: std::result::Result<Json<NewProduct>, JsonRejection>) -> Result<NewProduct> {
    payload
        .map(|Json(product)| product)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// List every product.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    ApiResponse::ok(state.catalog().list())
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    let product = state.catalog().get(parse_product_id(&id)?)?;
    Ok(ApiResponse::ok(product))
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewProduct>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let product = state.catalog().create(json_body(payload)?)?;
    Ok(ApiResponse::ok(product)
        .with_message("Product created successfully")
        .with_status(StatusCode::CREATED))
}

/// Replace a product.
#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<NewProduct>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let id = parse_product_id(&id)?;
    let product = state.catalog().update(id, json_body(payload)?)?;
    Ok(ApiResponse::ok(product).with_message("Product updated successfully"))
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    state.catalog().delete(parse_product_id(&id)?)?;
    Ok(ApiResponse::message("Product deleted successfully"))
}
