//! Integration tests for login, registration and session persistence.
//!
//! Each test runs against its own mock backend with the session persisted in
//! a temporary directory, so restores go through the real file store.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::Method;
use portfolio_client::{AuthError, AuthState, Session, SessionStore};
use portfolio_core::{Role, UserSummary, ValidationError};
use portfolio_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, ADMIN_TOKEN, Fault, MockBackend, USER_EMAIL, USER_PASSWORD,
};
use secrecy::ExposeSecret;
use serde_json::json;

const LOGIN: &str = "/api/auth/login";
const REGISTER: &str = "/api/auth/register";

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_persists_session_across_restart() {
    let backend = MockBackend::start().await;
    backend.respond_to_login(json!({
        "token": "t1",
        "user": { "username": "a", "role": "admin" }
    }));
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");

    let session = backend
        .client(&session_path)
        .auth()
        .login("admin", ADMIN_PASSWORD)
        .await
        .unwrap();

    let expected = Session::new(
        "t1",
        UserSummary {
            id: None,
            username: "a".to_string(),
            email: None,
            role: Role::Admin,
        },
    );
    assert_eq!(session, expected);

    // A fresh client over the same file sees the same identity
    let restarted = backend.client(&session_path);
    assert_eq!(restarted.session().current(), Some(expected));
}

#[tokio::test]
async fn test_login_with_email_or_username() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = backend.client(&dir.path().join("session.json"));

    let by_email = client.auth().login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    assert_eq!(by_email.token().expose_secret(), ADMIN_TOKEN);
    assert!(by_email.user().is_admin());

    let by_username = client.auth().login("testuser", USER_PASSWORD).await.unwrap();
    assert_eq!(by_username.user().role, Role::User);
    assert_eq!(by_username.user().email.as_deref(), Some(USER_EMAIL));
    assert_eq!(client.session().current(), Some(by_username));

    let sent = backend.requests_to(&Method::POST, LOGIN);
    assert_eq!(sent.len(), 2);
    assert_eq!(
        sent.first().unwrap().body,
        Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
    );
    assert!(sent.iter().all(|request| request.authorization.is_none()));
}

#[tokio::test]
async fn test_rejected_login_keeps_backend_message_until_input_changes() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = backend.client(&dir.path().join("session.json"));
    let auth = client.auth();

    let result = auth.login(ADMIN_EMAIL, "wrong-password").await;
    assert!(matches!(&result, Err(AuthError::Rejected(message)) if message == "Invalid credentials"));
    assert_eq!(auth.error().as_deref(), Some("Invalid credentials"));
    assert_eq!(auth.state(), AuthState::Idle);
    assert!(client.session().current().is_none());

    auth.input_changed();
    assert!(auth.error().is_none());
}

#[tokio::test]
async fn test_rejection_without_message_uses_fallback() {
    let backend = MockBackend::start().await;
    backend.inject(Method::POST, LOGIN, Fault::Status(500));
    let dir = tempfile::tempdir().unwrap();
    let client = backend.client(&dir.path().join("session.json"));

    let result = client.auth().login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert!(matches!(&result, Err(AuthError::Rejected(message)) if message == "Authentication failed"));
}

#[tokio::test]
async fn test_unreachable_backend_is_not_a_rejection() {
    let backend = MockBackend::start().await;
    backend.inject(Method::POST, LOGIN, Fault::DropConnection);
    let dir = tempfile::tempdir().unwrap();
    let client = backend.client(&dir.path().join("session.json"));
    let auth = client.auth();

    let result = auth.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert!(matches!(result, Err(AuthError::Unreachable(_))));
    assert!(auth.error().unwrap().starts_with("Cannot connect to server"));
    assert!(client.session().current().is_none());
}

#[tokio::test]
async fn test_blank_credentials_send_nothing() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = backend.client(&dir.path().join("session.json"));

    let result = client.auth().login("  ", ADMIN_PASSWORD).await;
    assert!(matches!(
        result,
        Err(AuthError::Validation(ValidationError::MissingField("email")))
    ));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_second_submit_while_pending_is_busy() {
    let backend = MockBackend::start().await;
    backend.inject(Method::POST, LOGIN, Fault::Delay(Duration::from_millis(200)));
    let dir = tempfile::tempdir().unwrap();
    let client = backend.client(&dir.path().join("session.json"));
    let auth = client.auth();

    let (first, second) = tokio::join!(
        auth.login(ADMIN_EMAIL, ADMIN_PASSWORD),
        auth.login(ADMIN_EMAIL, ADMIN_PASSWORD)
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(AuthError::Busy)));
    assert_eq!(backend.requests_to(&Method::POST, LOGIN).len(), 1);
    assert_eq!(auth.state(), AuthState::Idle);
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_logs_in_as_user() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let client = backend.client(&session_path);

    let session = client
        .auth()
        .register("newbie", "newbie@example.com", "secret1")
        .await
        .unwrap();

    assert_eq!(session.user().username, "newbie");
    assert_eq!(session.user().role, Role::User);
    assert!(session_path.exists());

    let sent = backend.requests_to(&Method::POST, REGISTER);
    assert_eq!(
        sent.first().unwrap().body,
        Some(json!({
            "username": "newbie",
            "email": "newbie@example.com",
            "password": "secret1"
        }))
    );
}

#[tokio::test]
async fn test_register_duplicate_surfaces_backend_message() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = backend.client(&dir.path().join("session.json"));

    let result = client
        .auth()
        .register("admin", "someone@example.com", "secret1")
        .await;
    assert!(matches!(
        &result,
        Err(AuthError::Rejected(message)) if message == "Username or email already exists"
    ));
}

#[tokio::test]
async fn test_register_short_password_sends_nothing() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let client = backend.client(&dir.path().join("session.json"));

    for password in ["", "a", "12345"] {
        let result = client
            .auth()
            .register("newbie", "newbie@example.com", password)
            .await;
        assert!(matches!(result, Err(AuthError::Validation(_))), "{password:?}");
    }

    let result = client
        .auth()
        .register("newbie", "not-an-email", "secret1")
        .await;
    assert!(matches!(
        result,
        Err(AuthError::Validation(ValidationError::InvalidEmail(_)))
    ));

    assert!(backend.requests().is_empty());
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn test_logout_clears_file_and_notifies() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let client = backend.client(&session_path);
    let mut identity = client.session().subscribe();

    client.auth().login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    assert!(identity.has_changed().unwrap());
    assert_eq!(
        identity.borrow_and_update().as_ref().map(|user| user.role),
        Some(Role::Admin)
    );

    client.auth().logout().unwrap();
    assert!(identity.has_changed().unwrap());
    assert!(identity.borrow_and_update().is_none());
    assert!(client.session().current().is_none());
    assert!(!session_path.exists());

    // Idempotent
    client.auth().logout().unwrap();
}

#[test]
fn test_partial_or_corrupt_session_files_restore_as_logged_out() {
    let dir = tempfile::tempdir().unwrap();
    let user = r#"{\"username\":\"a\",\"role\":\"admin\"}"#;
    let cases = [
        r#"{"authToken":"t1"}"#.to_string(),
        format!(r#"{{"user":"{user}"}}"#),
        r#"{"authToken":"t1","user":"not json"}"#.to_string(),
        format!(r#"{{"authToken":"","user":"{user}"}}"#),
        "not json at all".to_string(),
    ];

    for (index, contents) in cases.iter().enumerate() {
        let path = dir.path().join(format!("session-{index}.json"));
        std::fs::write(&path, contents).unwrap();

        let store = SessionStore::file(&path);
        assert!(store.restore().is_none(), "case {index}: {contents}");
        assert!(store.current().is_none());
        assert!(!path.exists(), "case {index} left the file behind");
    }
}

#[test]
fn test_well_formed_session_file_restores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(
        &path,
        r#"{"authToken":"t1","user":"{\"username\":\"a\",\"role\":\"admin\"}"}"#,
    )
    .unwrap();

    let restored = SessionStore::file(&path).restore().unwrap();
    assert_eq!(restored.token().expose_secret(), "t1");
    assert_eq!(restored.user().username, "a");
    assert!(restored.user().is_admin());
}
