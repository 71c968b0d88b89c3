//! UrbanCart Core - Shared types library.
//!
//! This crate provides common types used across all UrbanCart components:
//! - `storefront` - Session, cart and catalog service
//! - `cli` - Command-line tools for seeding the catalog
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no locking, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, usernames and session tokens

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
