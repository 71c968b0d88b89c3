//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::services::ServiceError;
use crate::services::auth::{AuthorizationGate, CredentialStore, SessionManager, TokenIssuer};
use crate::services::cart::CartStore;
use crate::services::catalog::InMemoryCatalog;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Every store lives here; there
/// is no global state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<InMemoryCatalog>,
    credentials: Arc<CredentialStore>,
    carts: Arc<CartStore>,
    sessions: SessionManager,
    gate: AuthorizationGate,
}

impl AppState {
    /// Create a new application state with empty stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the password hashing parameters are invalid.
    pub fn new(config: StorefrontConfig) -> Result<Self, ServiceError> {
        Self::with_token_issuer(config, TokenIssuer::default())
    }

    /// Create state whose tokens come from `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the password hashing parameters are invalid.
    pub fn with_token_issuer(
        config: StorefrontConfig,
        tokens: TokenIssuer,
    ) -> Result<Self, ServiceError> {
        let catalog = Arc::new(InMemoryCatalog::new(config.currency));
        let credentials = Arc::new(CredentialStore::new(config.password_cost)?);
        let carts = Arc::new(CartStore::new(catalog.clone()));
        let sessions = SessionManager::new(
            Arc::clone(&credentials),
            Arc::clone(&carts),
            tokens,
            config.session_ttl,
        );
        let gate = AuthorizationGate::new(Arc::clone(&credentials));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                credentials,
                carts,
                sessions,
                gate,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.inner.credentials
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.inner.catalog
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn carts(&self) -> &CartStore {
        &self.inner.carts
    }

    /// Get a reference to the session manager.
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    /// Get a reference to the authorization gate.
    #[must_use]
    pub fn gate(&self) -> &AuthorizationGate {
        &self.inner.gate
    }
}
