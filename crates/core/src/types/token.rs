//! Opaque session credentials.
//!
//! Both token types redact their value in `Debug` output so they never end
//! up in logs by accident. Use `expose()` at the points where the raw value
//! must leave the process (cookies, response bodies).

/// Macro to define an opaque, redacted token wrapper around `String`.
macro_rules! define_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            /// Wrap an already-encoded token value.
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// The raw token value.
            #[must_use]
            pub fn expose(&self) -> &str {
                &self.0
            }

            /// Consumes the token and returns the raw value.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Returns `true` if the token carries no value.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&"[REDACTED]").finish()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_token!(
    /// Credential proving an authenticated session.
    ///
    /// Carried in an `HttpOnly` cookie and never exposed to client script.
    SessionToken
);

define_token!(
    /// Anti-forgery credential echoed back by client script in a request header.
    CsrfToken
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_value() {
        let token = SessionToken::new("super-secret-value".to_string());
        let debug = format!("{token:?}");
        assert_eq!(debug, "SessionToken(\"[REDACTED]\")");
        assert!(!debug.contains("super-secret-value"));

        let csrf = CsrfToken::new("csrf-value".to_string());
        assert!(!format!("{csrf:?}").contains("csrf-value"));
    }

    #[test]
    fn test_expose_returns_raw_value() {
        let token = CsrfToken::from("abc".to_string());
        assert_eq!(token.expose(), "abc");
        assert!(!token.is_empty());
        assert!(CsrfToken::new(String::new()).is_empty());
    }
}
