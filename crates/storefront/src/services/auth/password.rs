//! Argon2id password hashing with a tunable cost.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::services::ServiceError;

/// Argon2id cost parameters.
///
/// Higher values make every hash (and every login) slower for attackers and
/// for the server alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes over memory.
    pub iterations: u32,
}

impl HashCost {
    /// Create a cost from explicit parameters.
    #[must_use]
    pub const fn new(memory_kib: u32, iterations: u32) -> Self {
        Self {
            memory_kib,
            iterations,
        }
    }

    /// Build the Argon2id hasher for this cost.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if the parameters are outside
    /// the ranges Argon2 accepts.
    pub fn hasher(&self) -> Result<Argon2<'static>, ServiceError> {
        let params = Params::new(
            self.memory_kib,
            self.iterations,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| ServiceError::InvalidInput(format!("argon2 parameters: {e}")))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for HashCost {
    fn default() -> Self {
        Self::new(Params::DEFAULT_M_COST, Params::DEFAULT_T_COST)
    }
}

/// Hash a password, returning the PHC-format string.
pub(super) fn hash_password(argon2: &Argon2<'_>, password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ServiceError::PasswordHash)
}

/// Verify a password against a PHC-format hash.
pub(super) fn verify_password(argon2: &Argon2<'_>, password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fast() -> Argon2<'static> {
        HashCost::new(8, 1).hasher().unwrap()
    }

    #[test]
    fn test_hash_is_salted() {
        let argon2 = fast();
        let a = hash_password(&argon2, "validpass").unwrap();
        let b = hash_password(&argon2, "validpass").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify_roundtrip() {
        let argon2 = fast();
        let hash = hash_password(&argon2, "validpass").unwrap();
        assert!(verify_password(&argon2, "validpass", &hash));
        assert!(!verify_password(&argon2, "wrongpass", &hash));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password(&fast(), "validpass", "not-a-phc-string"));
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        assert!(HashCost::new(0, 0).hasher().is_err());
    }
}
