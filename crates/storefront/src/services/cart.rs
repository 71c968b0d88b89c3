//! Session-scoped shopping carts.
//!
//! Carts are keyed by session token and created lazily on the first add.
//! The outer map lock is only held long enough to find or insert a cart;
//! each cart then has its own mutex, so concurrent requests on different
//! sessions do not serialize on each other.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use urbancart_core::ProductId;

use super::ServiceError;
use super::auth::Authorized;
use super::catalog::Catalog;

type CartLines = Arc<Mutex<Vec<CartItem>>>;

/// One line of a cart.
///
/// Adding the same product twice yields two independent lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub size: String,
}

impl CartItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Snapshot of a cart with its computed total.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub total: Decimal,
}

impl CartSummary {
    fn of(items: Vec<CartItem>) -> Self {
        let total = total(&items);
        Self { items, total }
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn total(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

/// Owns every session's cart.
///
/// Every operation except [`CartStore::drop_cart`] requires an
/// [`Authorized`] proof from the gate.
pub struct CartStore {
    carts: RwLock<HashMap<String, CartLines>>,
    catalog: Arc<dyn Catalog>,
}

impl CartStore {
    /// Create an empty store pricing lines from `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            carts: RwLock::new(HashMap::new()),
            catalog,
        }
    }

    async fn existing(&self, session_token: &str) -> Option<CartLines> {
        self.carts.read().await.get(session_token).cloned()
    }

    async fn get_or_create(&self, session_token: &str) -> CartLines {
        if let Some(lines) = self.existing(session_token).await {
            return lines;
        }
        Arc::clone(
            self.carts
                .write()
                .await
                .entry(session_token.to_owned())
                .or_default(),
        )
    }

    /// Append a new line for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if `quantity` is not positive and
    /// `ServiceError::NotFound` if the catalog does not know the product.
    pub async fn add(
        &self,
        auth: &Authorized<'_>,
        product_id: ProductId,
        quantity: i32,
        size: &str,
    ) -> Result<CartItem, ServiceError> {
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| ServiceError::InvalidInput("quantity must be positive".to_string()))?;

        let product = self
            .catalog
            .lookup_product(product_id)
            .ok_or_else(|| ServiceError::NotFound(format!("product {product_id}")))?;

        let item = CartItem {
            product_id,
            name: product.name,
            unit_price: product.unit_price,
            quantity,
            size: size.to_owned(),
        };

        let lines = self.get_or_create(auth.session_token()).await;
        lines.lock().await.push(item.clone());

        tracing::debug!(username = %auth.username(), %product_id, quantity, "cart line added");
        Ok(item)
    }

    /// Current lines and total. An absent cart reads as empty.
    pub async fn view(&self, auth: &Authorized<'_>) -> CartSummary {
        match self.existing(auth.session_token()).await {
            Some(lines) => CartSummary::of(lines.lock().await.clone()),
            None => CartSummary::of(Vec::new()),
        }
    }

    /// Remove every line for `product_id`, returning how many were removed.
    ///
    /// Removing a product that is not in the cart is not an error.
    pub async fn remove(&self, auth: &Authorized<'_>, product_id: ProductId) -> usize {
        let Some(lines) = self.existing(auth.session_token()).await else {
            return 0;
        };

        let mut lines = lines.lock().await;
        let before = lines.len();
        lines.retain(|item| item.product_id != product_id);
        before - lines.len()
    }

    /// Compute the total and empty the cart in one critical section.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if the cart is empty.
    pub async fn checkout(&self, auth: &Authorized<'_>) -> Result<Decimal, ServiceError> {
        let empty = || ServiceError::InvalidInput("cart is empty".to_string());

        let lines = self.existing(auth.session_token()).await.ok_or_else(empty)?;
        let mut lines = lines.lock().await;
        if lines.is_empty() {
            return Err(empty());
        }

        let total = total(&lines);
        lines.clear();
        drop(lines);

        tracing::info!(username = %auth.username(), %total, "checkout completed");
        Ok(total)
    }

    /// Discard the cart keyed by `session_token`.
    ///
    /// Called by the session manager while it holds the credential write
    /// guard, so no authorized operation can be in flight for that token.
    pub(crate) async fn drop_cart(&self, session_token: &str) -> bool {
        self.carts.write().await.remove(session_token).is_some()
    }

    /// Number of carts currently held.
    pub async fn cart_count(&self) -> usize {
        self.carts.read().await.len()
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::services::test_support::Harness;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_total_sums_every_line() {
        let h = Harness::new();
        let issued = h.logged_in("validuser").await;
        let auth = h.gate.check(&Harness::credentials_for(&issued)).await.unwrap();

        h.carts.add(&auth, 1.into(), 2, "M").await.unwrap();
        h.carts.add(&auth, 2.into(), 1, "G").await.unwrap();

        let summary = h.carts.view(&auth).await;
        assert_eq!(summary.items.len(), 2);
        assert_eq!(summary.total, dec("25.50"));
    }

    #[tokio::test]
    async fn test_empty_cart_view() {
        let h = Harness::new();
        let issued = h.logged_in("validuser").await;
        let auth = h.gate.check(&Harness::credentials_for(&issued)).await.unwrap();

        let summary = h.carts.view(&auth).await;
        assert!(summary.is_empty());
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_quantity_and_unknown_product() {
        let h = Harness::new();
        let issued = h.logged_in("validuser").await;
        let auth = h.gate.check(&Harness::credentials_for(&issued)).await.unwrap();

        for quantity in [0, -3] {
            assert!(matches!(
                h.carts.add(&auth, 1.into(), quantity, "M").await,
                Err(ServiceError::InvalidInput(_))
            ));
        }
        assert!(matches!(
            h.carts.add(&auth, 99.into(), 1, "M").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(h.carts.view(&auth).await.is_empty());
    }

    #[tokio::test]
    async fn test_same_product_twice_is_two_lines() {
        let h = Harness::new();
        let issued = h.logged_in("validuser").await;
        let auth = h.gate.check(&Harness::credentials_for(&issued)).await.unwrap();

        h.carts.add(&auth, 1.into(), 1, "M").await.unwrap();
        h.carts.add(&auth, 1.into(), 1, "M").await.unwrap();

        assert_eq!(h.carts.view(&auth).await.items.len(), 2);
    }

    #[tokio::test]
    async fn test_checkout_returns_total_and_empties_cart() {
        let h = Harness::new();
        let issued = h.logged_in("validuser").await;
        let auth = h.gate.check(&Harness::credentials_for(&issued)).await.unwrap();

        h.carts.add(&auth, 1.into(), 2, "M").await.unwrap();
        h.carts.add(&auth, 2.into(), 1, "M").await.unwrap();

        assert_eq!(h.carts.checkout(&auth).await.unwrap(), dec("25.50"));
        assert!(h.carts.view(&auth).await.is_empty());
        assert!(matches!(
            h.carts.checkout(&auth).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_checkout_without_cart_is_invalid() {
        let h = Harness::new();
        let issued = h.logged_in("validuser").await;
        let auth = h.gate.check(&Harness::credentials_for(&issued)).await.unwrap();

        assert!(matches!(
            h.carts.checkout(&auth).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_drops_every_matching_line() {
        let h = Harness::new();
        let issued = h.logged_in("validuser").await;
        let auth = h.gate.check(&Harness::credentials_for(&issued)).await.unwrap();

        h.carts.add(&auth, 1.into(), 1, "M").await.unwrap();
        h.carts.add(&auth, 1.into(), 3, "G").await.unwrap();
        h.carts.add(&auth, 2.into(), 1, "P").await.unwrap();

        assert_eq!(h.carts.remove(&auth, 1.into()).await, 2);
        let summary = h.carts.view(&auth).await;
        assert_eq!(summary.items.len(), 1);
        assert_eq!(summary.items.first().unwrap().product_id, ProductId::new(2));

        // idempotent
        assert_eq!(h.carts.remove(&auth, 1.into()).await, 0);
    }

    #[tokio::test]
    async fn test_carts_are_isolated_per_session() {
        let h = Harness::new();
        let alice = h.logged_in("aliceuser").await;
        let bob = h.logged_in("bobbyuser").await;

        {
            let auth = h.gate.check(&Harness::credentials_for(&alice)).await.unwrap();
            h.carts.add(&auth, 1.into(), 1, "M").await.unwrap();
        }

        let auth = h.gate.check(&Harness::credentials_for(&bob)).await.unwrap();
        assert!(h.carts.view(&auth).await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_lose_no_lines() {
        const ADDS: usize = 64;

        let h = Arc::new(Harness::new());
        let issued = h.logged_in("validuser").await;
        let credentials = Harness::credentials_for(&issued);

        let mut tasks = Vec::with_capacity(ADDS);
        for _ in 0..ADDS {
            let h = Arc::clone(&h);
            let credentials = credentials.clone();
            tasks.push(tokio::spawn(async move {
                let auth = h.gate.check(&credentials).await.unwrap();
                h.carts.add(&auth, 1.into(), 1, "M").await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let auth = h.gate.check(&credentials).await.unwrap();
        assert_eq!(h.carts.view(&auth).await.items.len(), ADDS);
    }
}
