//! Core types for UrbanCart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod token;
pub mod username;

pub use id::*;
pub use price::{CurrencyCode, CurrencyCodeError, Price};
pub use token::{CsrfToken, SessionToken};
pub use username::{Username, UsernameError};
