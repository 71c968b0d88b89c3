//! Login behaviour when the entropy source fails.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;

use urbancart_integration_tests::{PASSWORD, TestApp};
use urbancart_storefront::services::auth::{EntropySource, OsEntropy, TokenIssuer};

/// OS entropy until `fail` is set.
#[derive(Default)]
struct SwitchableEntropy {
    fail: AtomicBool,
}

impl EntropySource for SwitchableEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("entropy pool unavailable".to_string());
        }
        OsEntropy.fill(dest)
    }
}

#[tokio::test]
async fn test_login_without_entropy_issues_nothing() {
    let entropy = Arc::new(SwitchableEntropy::default());
    let app = TestApp::with_token_issuer(TokenIssuer::new(entropy.clone()));

    let existing = app.login_new_user("validuser").await;
    assert_eq!(
        app.register("otheruser", PASSWORD).await.status,
        StatusCode::CREATED
    );

    entropy.fail.store(true, Ordering::SeqCst);

    for username in ["validuser", "otheruser"] {
        let response = app.login(username, PASSWORD).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.message(), "Internal server error");
        assert!(response.set_cookies().is_empty(), "user {username}");
        assert!(response.body.get("data").is_none());
    }

    // The earlier session is neither rotated nor joined by a new one
    let users = app.state.credentials().read().await;
    assert_eq!(users.active_sessions(), 1);
    assert!(users.get("otheruser").unwrap().session.is_none());
    drop(users);
    let holder = app
        .state
        .credentials()
        .find_by_session_token(&existing.session_token)
        .await
        .unwrap();
    assert_eq!(holder.username.as_str(), "validuser");

    let response = app.get_as("/protected", &existing).await;
    assert_eq!(response.status, StatusCode::OK);
}
