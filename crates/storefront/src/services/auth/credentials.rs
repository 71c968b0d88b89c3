//! In-memory user credential store.
//!
//! Users are never deleted; logging out only clears the active session.
//! A secondary index maps session tokens to usernames so lookups by token do
//! not scan every user, and it is updated under the same write guard as the
//! user record itself.

use std::collections::HashMap;

use argon2::Argon2;
use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use urbancart_core::{CsrfToken, SessionToken, Username};

use super::MIN_PASSWORD_LENGTH;
use super::password::{HashCost, hash_password, verify_password};
use crate::services::ServiceError;

/// Password used to build the hash that unknown usernames are verified against.
const DUMMY_PASSWORD: &str = "urbancart-timing-equalizer";

/// The token pair of a logged-in user.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session_token: SessionToken,
    pub csrf_token: CsrfToken,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ActiveSession {
    /// Whether the session has passed its expiry time.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A registered user.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: Username,
    pub password_hash: String,
    /// `None` while logged out.
    pub session: Option<ActiveSession>,
}

/// User records plus the session-token index.
///
/// Only reachable through a [`CredentialStore`] guard.
#[derive(Debug, Default)]
pub struct Users {
    records: HashMap<Username, UserRecord>,
    by_session: HashMap<String, Username>,
}

impl Users {
    /// Look up a user by username.
    #[must_use]
    pub fn get(&self, username: &str) -> Option<&UserRecord> {
        self.records.get(username)
    }

    /// Look up the user currently holding `token`.
    #[must_use]
    pub fn find_by_session_token(&self, token: &str) -> Option<&UserRecord> {
        self.by_session
            .get(token)
            .and_then(|username| self.records.get(username))
    }

    /// Number of users with an active session.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.by_session.len()
    }

    /// Store a new token pair on `username`, replacing any previous one.
    ///
    /// Returns the session token that was replaced, if any.
    pub(super) fn set_tokens(
        &mut self,
        username: &str,
        session: ActiveSession,
    ) -> Result<Option<SessionToken>, ServiceError> {
        let new_key = session.session_token.expose().to_owned();
        if self.by_session.contains_key(&new_key) {
            return Err(ServiceError::Entropy(
                "generated session token collides with an active session".to_string(),
            ));
        }

        let record = self
            .records
            .get_mut(username)
            .ok_or(ServiceError::Unauthorized)?;

        let previous = record.session.replace(session).map(|old| old.session_token);
        if let Some(old) = &previous {
            self.by_session.remove(old.expose());
        }
        self.by_session.insert(new_key, record.username.clone());

        Ok(previous)
    }

    /// Clear the token pair on `username`, returning the session that ended.
    pub(super) fn clear_tokens(&mut self, username: &str) -> Option<ActiveSession> {
        let ended = self.records.get_mut(username)?.session.take()?;
        self.by_session.remove(ended.session_token.expose());
        Some(ended)
    }

    /// Usernames whose session has expired at `now`.
    pub(super) fn expired(&self, now: DateTime<Utc>) -> Vec<Username> {
        self.records
            .values()
            .filter(|r| r.session.as_ref().is_some_and(|s| s.is_expired(now)))
            .map(|r| r.username.clone())
            .collect()
    }
}

/// Owns every user record and guards it with a single reader-writer lock.
///
/// Reads (gate checks, lookups) proceed concurrently; register, token
/// rotation and logout take the write guard for their whole
/// read-modify-write.
pub struct CredentialStore {
    users: RwLock<Users>,
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl CredentialStore {
    /// Create an empty store hashing passwords at `cost`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cost parameters are invalid or the timing
    /// equalizer hash cannot be computed.
    pub fn new(cost: HashCost) -> Result<Self, ServiceError> {
        let argon2 = cost.hasher()?;
        let dummy_hash = hash_password(&argon2, DUMMY_PASSWORD)?;

        Ok(Self {
            users: RwLock::new(Users::default()),
            argon2,
            dummy_hash,
        })
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidInput` if the username or password is
    /// shorter than 8 bytes.
    /// Returns `ServiceError::Conflict` if the username is taken.
    pub async fn register(&self, username: &str, password: &str) -> Result<Username, ServiceError> {
        let username =
            Username::parse(username).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} bytes"
            )));
        }

        // Conflict already discloses the account, so answering it before
        // hashing leaks nothing further. The write guard rechecks below.
        if self.users.read().await.get(username.as_str()).is_some() {
            return Err(ServiceError::Conflict);
        }

        let password_hash = hash_password(&self.argon2, password)?;

        let mut users = self.users.write().await;
        if users.records.contains_key(&username) {
            return Err(ServiceError::Conflict);
        }
        users.records.insert(
            username.clone(),
            UserRecord {
                username: username.clone(),
                password_hash,
                session: None,
            },
        );

        Ok(username)
    }

    /// Check a username/password pair.
    ///
    /// Unknown usernames are verified against a dummy hash of the same cost
    /// so the response time does not reveal whether the account exists.
    pub async fn verify_password(&self, username: &str, password: &str) -> bool {
        let stored = self
            .users
            .read()
            .await
            .get(username)
            .map(|r| r.password_hash.clone());

        match stored {
            Some(hash) => verify_password(&self.argon2, password, &hash),
            None => {
                let _ = verify_password(&self.argon2, password, &self.dummy_hash);
                false
            }
        }
    }

    /// Snapshot of the user holding `token`, if any.
    pub async fn find_by_session_token(&self, token: &str) -> Option<UserRecord> {
        self.users.read().await.find_by_session_token(token).cloned()
    }

    /// Shared guard over all records.
    pub async fn read(&self) -> RwLockReadGuard<'_, Users> {
        self.users.read().await
    }

    /// Exclusive guard over all records.
    pub(super) async fn write(&self) -> RwLockWriteGuard<'_, Users> {
        self.users.write().await
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(HashCost::new(8, 1)).unwrap()
    }

    fn session(token: &str, csrf: &str) -> ActiveSession {
        let now = Utc::now();
        ActiveSession {
            session_token: SessionToken::new(token.to_string()),
            csrf_token: CsrfToken::new(csrf.to_string()),
            issued_at: now,
            expires_at: now + TimeDelta::hours(24),
        }
    }

    #[tokio::test]
    async fn test_register_twice_conflicts() {
        let store = store();
        store.register("validuser", "validpass").await.unwrap();
        let err = store.register("validuser", "otherpass").await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict));
    }

    #[tokio::test]
    async fn test_register_rejects_short_fields() {
        let store = store();
        assert!(matches!(
            store.register("short", "alsoshort").await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            store.register("validuser", "short").await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(store.register("validuser", "validpass").await.is_ok());
    }

    #[tokio::test]
    async fn test_register_measures_length_in_bytes() {
        let store = store();
        assert!(store.register("valid user1", "validpass").await.is_ok());
        // 4 characters, 8 bytes each
        assert!(store.register("ãããã", "çççç").await.is_ok());
        assert!(matches!(
            store.register("ããã", "validpass").await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            store.register("otheruser", "ççç").await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let store = store();
        store.register("validuser", "validpass").await.unwrap();
        let users = store.read().await;
        let record = users.get("validuser").unwrap();
        assert_ne!(record.password_hash, "validpass");
        assert!(record.session.is_none());
    }

    #[tokio::test]
    async fn test_verify_password() {
        let store = store();
        store.register("validuser", "validpass").await.unwrap();
        assert!(store.verify_password("validuser", "validpass").await);
        assert!(!store.verify_password("validuser", "wrongpass").await);
        assert!(!store.verify_password("nosuchuser", "validpass").await);
    }

    #[tokio::test]
    async fn test_set_tokens_maintains_index() {
        let store = store();
        store.register("validuser", "validpass").await.unwrap();

        let previous = store
            .write()
            .await
            .set_tokens("validuser", session("tok-1", "csrf-1"))
            .unwrap();
        assert!(previous.is_none());
        assert_eq!(
            store.find_by_session_token("tok-1").await.unwrap().username.as_str(),
            "validuser"
        );

        let previous = store
            .write()
            .await
            .set_tokens("validuser", session("tok-2", "csrf-2"))
            .unwrap();
        assert_eq!(previous.unwrap().expose(), "tok-1");
        assert!(store.find_by_session_token("tok-1").await.is_none());
        assert!(store.find_by_session_token("tok-2").await.is_some());
        assert_eq!(store.read().await.active_sessions(), 1);
    }

    #[tokio::test]
    async fn test_set_tokens_unknown_user() {
        let store = store();
        let err = store
            .write()
            .await
            .set_tokens("nosuchuser", session("tok", "csrf"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
    }

    #[tokio::test]
    async fn test_clear_tokens() {
        let store = store();
        store.register("validuser", "validpass").await.unwrap();
        store
            .write()
            .await
            .set_tokens("validuser", session("tok", "csrf"))
            .unwrap();

        let ended = store.write().await.clear_tokens("validuser").unwrap();
        assert_eq!(ended.session_token.expose(), "tok");
        assert!(store.find_by_session_token("tok").await.is_none());
        assert!(store.write().await.clear_tokens("validuser").is_none());
    }

    #[tokio::test]
    async fn test_expired_lists_only_stale_sessions() {
        let store = store();
        store.register("staleuser", "validpass").await.unwrap();
        store.register("freshuser", "validpass").await.unwrap();

        let mut stale = session("stale", "csrf-a");
        stale.expires_at = Utc::now() - TimeDelta::seconds(1);
        store.write().await.set_tokens("staleuser", stale).unwrap();
        store
            .write()
            .await
            .set_tokens("freshuser", session("fresh", "csrf-b"))
            .unwrap();

        let expired = store.read().await.expired(Utc::now());
        assert_eq!(expired.len(), 1);
        assert_eq!(expired.first().unwrap().as_str(), "staleuser");
    }
}
