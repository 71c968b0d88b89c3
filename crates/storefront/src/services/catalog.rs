//! In-memory product catalog.
//!
//! Products are kept in id order and ids are never reused. The catalog has
//! no invariants beyond id uniqueness and non-negative stock, so a
//! synchronous `parking_lot` lock is enough; no guard is ever held across
//! an `.await`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use urbancart_core::{CurrencyCode, Price, ProductId};

use super::ServiceError;

/// The subset of a product the cart needs to price a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    pub name: String,
    pub unit_price: Decimal,
}

/// Read-only product lookup used by the cart.
pub trait Catalog: Send + Sync {
    /// Resolve a product id to its name and unit price.
    fn lookup_product(&self, id: ProductId) -> Option<ProductSummary>;
}

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub brand: String,
    pub category: String,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating or replacing a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stock_quantity: i32,
}

impl NewProduct {
    /// Check the fields that have range constraints.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` for an empty name, a price that
    /// is not positive, or negative stock.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::InvalidInput("name is required".to_string()));
        }
        if self.price <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "price must be greater than zero".to_string(),
            ));
        }
        if self.stock_quantity < 0 {
            return Err(ServiceError::InvalidInput(
                "stock quantity cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Inventory {
    products: BTreeMap<ProductId, Product>,
    next_id: ProductId,
}

/// Product store held entirely in memory.
#[derive(Debug)]
pub struct InMemoryCatalog {
    inventory: RwLock<Inventory>,
    currency: CurrencyCode,
}

impl InMemoryCatalog {
    /// Create an empty catalog pricing products in `currency`.
    #[must_use]
    pub fn new(currency: CurrencyCode) -> Self {
        Self {
            inventory: RwLock::new(Inventory {
                products: BTreeMap::new(),
                next_id: ProductId::new(1),
            }),
            currency,
        }
    }

    /// All products, ordered by id.
    pub fn list(&self) -> Vec<Product> {
        self.inventory.read().products.values().cloned().collect()
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no product has `id`.
    pub fn get(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.inventory
            .read()
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Add a product and assign it the next free id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if the product fails validation.
    pub fn create(&self, new: NewProduct) -> Result<Product, ServiceError> {
        new.validate()?;

        let mut inventory = self.inventory.write();
        let id = inventory.next_id;
        inventory.next_id = id.next();

        let product = self.build(id, new, Utc::now());
        inventory.products.insert(id, product.clone());
        drop(inventory);

        tracing::info!(product_id = %id, name = %product.name, "product created");
        Ok(product)
    }

    /// Replace every field of product `id` except its id and creation time.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if the product fails validation
    /// and `ServiceError::NotFound` if `id` does not exist.
    pub fn update(&self, id: ProductId, new: NewProduct) -> Result<Product, ServiceError> {
        new.validate()?;

        let mut inventory = self.inventory.write();
        let slot = inventory.products.get_mut(&id).ok_or_else(|| not_found(id))?;
        *slot = self.build(id, new, slot.created_at);
        let product = slot.clone();
        drop(inventory);

        tracing::info!(product_id = %id, "product updated");
        Ok(product)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no product has `id`.
    pub fn delete(&self, id: ProductId) -> Result<(), ServiceError> {
        self.inventory
            .write()
            .products
            .remove(&id)
            .ok_or_else(|| not_found(id))?;

        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    fn build(&self, id: ProductId, new: NewProduct, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            name: new.name,
            description: new.description,
            price: Price::new(new.price, self.currency),
            images: new.images,
            sizes: new.sizes,
            brand: new.brand,
            category: new.category,
            stock_quantity: new.stock_quantity,
            created_at,
        }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new(CurrencyCode::default())
    }
}

impl Catalog for InMemoryCatalog {
    fn lookup_product(&self, id: ProductId) -> Option<ProductSummary> {
        self.inventory
            .read()
            .products
            .get(&id)
            .map(|p| ProductSummary {
                name: p.name.clone(),
                unit_price: p.price.amount,
            })
    }
}

fn not_found(id: ProductId) -> ServiceError {
    ServiceError::NotFound(format!("product {id}"))
}
