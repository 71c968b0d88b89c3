//! Shared fixtures for service unit tests.

#![allow(clippy::unwrap_used)]

use std::str::FromStr;
use std::sync::Arc;

use chrono::TimeDelta;
use rust_decimal::Decimal;

use super::auth::{
    AuthorizationGate, CredentialStore, Credentials, HashCost, IssuedSession, SessionManager,
    TokenIssuer,
};
use super::cart::CartStore;
use super::catalog::{InMemoryCatalog, NewProduct};

/// Password every harness user is registered with.
pub const PASSWORD: &str = "validpass";

/// Fully wired services over a two-product catalog:
/// product 1 at 10.00 and product 2 at 5.50.
pub struct Harness {
    pub catalog: Arc<InMemoryCatalog>,
    pub credentials: Arc<CredentialStore>,
    pub carts: Arc<CartStore>,
    pub sessions: SessionManager,
    pub gate: AuthorizationGate,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ttl(TimeDelta::hours(24))
    }

    pub fn with_ttl(ttl: TimeDelta) -> Self {
        let catalog = Arc::new(InMemoryCatalog::default());
        for (name, price) in [("Camiseta Street Urban", "10.00"), ("Boné Snapback", "5.50")] {
            catalog
                .create(NewProduct {
                    name: name.to_string(),
                    description: String::new(),
                    price: Decimal::from_str(price).unwrap(),
                    images: vec![],
                    sizes: vec!["P".to_string(), "M".to_string(), "G".to_string()],
                    brand: "UrbanWear".to_string(),
                    category: "Roupas".to_string(),
                    stock_quantity: 50,
                })
                .unwrap();
        }

        // Minimal argon2 cost keeps the suite fast
        let credentials = Arc::new(CredentialStore::new(HashCost::new(8, 1)).unwrap());
        let carts = Arc::new(CartStore::new(catalog.clone()));
        let sessions = SessionManager::new(
            Arc::clone(&credentials),
            Arc::clone(&carts),
            TokenIssuer::default(),
            ttl,
        );
        let gate = AuthorizationGate::new(Arc::clone(&credentials));

        Self {
            catalog,
            credentials,
            carts,
            sessions,
            gate,
        }
    }

    /// Register `username` with [`PASSWORD`] and log in.
    pub async fn logged_in(&self, username: &str) -> IssuedSession {
        self.sessions.register(username, PASSWORD).await.unwrap();
        self.sessions.login(username, PASSWORD).await.unwrap()
    }

    /// The credentials a browser would present for `issued`.
    pub fn credentials_for(issued: &IssuedSession) -> Credentials {
        Credentials {
            username: Some(issued.username.to_string()),
            session_token: Some(issued.session_token.expose().to_owned()),
            csrf_token: Some(issued.csrf_token.expose().to_owned()),
        }
    }
}
