//! Opaque token generation.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::TryRngCore;
use rand::rngs::OsRng;

use urbancart_core::{CsrfToken, SessionToken};

use crate::services::ServiceError;

/// Number of random bytes behind every session and CSRF token.
pub const TOKEN_BYTES: usize = 32;

/// Source of cryptographically secure random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure if the source could not
    /// produce the requested bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<(), String>;
}

/// The operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), String> {
        OsRng.try_fill_bytes(dest).map_err(|e| e.to_string())
    }
}

/// Generates fixed-length random tokens encoded as URL-safe base64.
#[derive(Clone)]
pub struct TokenIssuer {
    source: Arc<dyn EntropySource>,
}

impl TokenIssuer {
    /// Create an issuer backed by the given entropy source.
    #[must_use]
    pub fn new(source: Arc<dyn EntropySource>) -> Self {
        Self { source }
    }

    /// Draw `byte_length` random bytes and encode them.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Entropy` if the entropy source fails. A partial
    /// or zeroed buffer is never encoded.
    pub fn generate(&self, byte_length: usize) -> Result<String, ServiceError> {
        let mut bytes = vec![0u8; byte_length];

        self.source.fill(&mut bytes).map_err(|e| {
            tracing::error!(error = %e, "entropy source failed, refusing to issue token");
            ServiceError::Entropy(e)
        })?;

        Ok(URL_SAFE_NO_PAD.encode(&bytes))
    }

    /// Generate an independent session/CSRF token pair.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Entropy` if either token cannot be generated.
    pub fn session_pair(&self) -> Result<(SessionToken, CsrfToken), ServiceError> {
        let session = SessionToken::new(self.generate(TOKEN_BYTES)?);
        let csrf = CsrfToken::new(self.generate(TOKEN_BYTES)?);
        Ok((session, csrf))
    }
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new(Arc::new(OsEntropy))
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct BrokenEntropy;

    impl EntropySource for BrokenEntropy {
        fn fill(&self, _dest: &mut [u8]) -> Result<(), String> {
            Err("device unavailable".to_string())
        }
    }

    #[test]
    fn test_generate_encodes_requested_bytes() {
        let token = TokenIssuer::default().generate(TOKEN_BYTES).unwrap();
        // 32 bytes -> 43 unpadded base64 characters
        assert_eq!(token.len(), 43);
        assert_eq!(URL_SAFE_NO_PAD.decode(&token).unwrap().len(), TOKEN_BYTES);
    }

    #[test]
    fn test_generate_is_url_safe() {
        let token = TokenIssuer::default().generate(64).unwrap();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_session_pair_tokens_differ() {
        let (session, csrf) = TokenIssuer::default().session_pair().unwrap();
        assert_ne!(session.expose(), csrf.expose());
    }

    #[test]
    fn test_broken_entropy_fails_loudly() {
        let issuer = TokenIssuer::new(Arc::new(BrokenEntropy));
        let err = issuer.generate(TOKEN_BYTES).unwrap_err();
        assert!(matches!(err, ServiceError::Entropy(_)));
        assert!(issuer.session_pair().is_err());
    }
}
