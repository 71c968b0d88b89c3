//! Seed a running storefront with catalog products.
//!
//! Reads a YAML list of products, validates every entry before sending
//! anything, then creates each product through `POST /products`.

use std::path::Path;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{error, info};

use urbancart_storefront::services::catalog::NewProduct;

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Seed file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Seed file could not be read.
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not a valid product list.
    #[error("Invalid seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more products failed validation.
    #[error("{0} validation errors found")]
    Invalid(usize),

    /// HTTP client could not be built or the server is unreachable.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected some products.
    #[error("{failed} of {total} products failed to seed")]
    Partial { failed: usize, total: usize },
}

/// Outcome of a seeding run.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub created: usize,
    pub errors: Vec<(String, String)>,
}

/// Parse and validate a product seed file.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or any product is invalid.
pub fn parse_products(content: &str) -> Result<Vec<NewProduct>, SeedError> {
    let products: Vec<NewProduct> = serde_yaml::from_str(content)?;

    let errors: Vec<String> = products
        .iter()
        .filter_map(|p| p.validate().err().map(|e| format!("{}: {e}", p.name)))
        .collect();

    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    Ok(products)
}

/// Create every product in `file_path` on the storefront at `base_url`.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded, fails validation, or any
/// product is rejected by the server.
pub async fn products(file_path: &str, base_url: &str, dry_run: bool) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_string()));
    }

    info!(path = %file_path, "Loading products from file");
    let content = tokio::fs::read_to_string(path).await?;
    let products = parse_products(&content)?;
    info!(products = products.len(), "Seed file validated");

    if dry_run {
        info!("Dry run, nothing sent");
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;
    let endpoint = format!("{}/products", base_url.trim_end_matches('/'));

    let mut result = SeedResult::default();
    for product in &products {
        let response = client.post(&endpoint).json(product).send().await?;
        let status = response.status();

        if status == StatusCode::CREATED {
            info!(name = %product.name, "Product created");
            result.created += 1;
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(name = %product.name, %status, "Product rejected");
            result.errors.push((product.name.clone(), format!("{status}: {body}")));
        }
    }

    info!("Seeding complete!");
    info!("  Products created: {}", result.created);

    if result.errors.is_empty() {
        Ok(())
    } else {
        error!("  Errors: {}", result.errors.len());
        for (name, err) in &result.errors {
            error!("    - {name}: {err}");
        }
        Err(SeedError::Partial {
            failed: result.errors.len(),
            total: products.len(),
        })
    }
}
