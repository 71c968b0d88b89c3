//! Authentication service.
//!
//! Provides password registration/login, per-session token issuance and the
//! authorization gate that every protected operation goes through.
//!
//! # Components
//!
//! - [`CredentialStore`] - user records, password hashes, active session tokens
//! - [`TokenIssuer`] - random URL-safe tokens from the OS entropy source
//! - [`SessionManager`] - register/login/logout and session expiry
//! - [`AuthorizationGate`] - double-submit CSRF check for protected requests

mod credentials;
mod gate;
mod password;
mod session;
mod token;

pub use credentials::{ActiveSession, CredentialStore, UserRecord, Users};
pub use gate::{AuthorizationGate, Authorized, Credentials};
pub use password::HashCost;
pub use session::{IssuedSession, SessionManager};
pub use token::{EntropySource, OsEntropy, TOKEN_BYTES, TokenIssuer};

/// Minimum password length, in bytes.
pub const MIN_PASSWORD_LENGTH: usize = 8;
