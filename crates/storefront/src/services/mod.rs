//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Credential store, token issuance, session lifecycle and the
//!   authorization gate for protected operations
//! - `cart` - Per-session line items, totals and checkout
//! - `catalog` - In-memory product store consumed by the cart
//!
//! All services share the closed [`ServiceError`] taxonomy so the routing
//! layer can map outcomes to responses without inspecting message strings.

pub mod auth;
pub mod cart;
pub mod catalog;
mod error;

pub use error::ServiceError;

#[cfg(test)]
pub(crate) mod test_support;
