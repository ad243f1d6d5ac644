//! Integration tests for the authenticated admin endpoints.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use portfolio_client::{ModerationError, PortfolioClient};
use portfolio_core::{ContactMessageId, ProgressStatus, TestimonialId, TestimonialStatus};
use portfolio_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, ADMIN_TOKEN, Fault, MockBackend, USER_EMAIL, USER_PASSWORD,
};
use serde_json::json;
use tempfile::TempDir;

async fn logged_in(backend: &MockBackend, email: &str, password: &str) -> (PortfolioClient, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let client = backend.client(&dir.path().join("session.json"));
    client.auth().login(email, password).await.unwrap();
    backend.clear_requests();
    (client, dir)
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_reads_carry_bearer_token() {
    let backend = MockBackend::start().await;
    let (client, _dir) = logged_in(&backend, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let moderation = client.moderation();

    let stats = moderation.get_stats().await.unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_testimonials, 4);
    assert_eq!(stats.pending_testimonials, 2);
    assert_eq!(stats.unread_messages, 1);
    assert_eq!(stats.contact_messages.replied, 1);
    assert_eq!(stats.shop_inquiries.total, 1);
    assert!(stats.recent_activity.len() <= 5);

    let testimonials = moderation.list_testimonials().await.unwrap();
    assert_eq!(testimonials.len(), 4);
    assert!(testimonials.iter().any(|t| t.status == TestimonialStatus::Rejected));

    let messages = moderation.list_contact_messages().await.unwrap();
    let unread = messages.iter().find(|m| m.id == ContactMessageId::new(11)).unwrap();
    assert_eq!(unread.status, ProgressStatus::New);
    assert!(!unread.replied);

    assert_eq!(moderation.list_shop_inquiries().await.unwrap().len(), 1);
    assert_eq!(moderation.list_users().await.unwrap().len(), 2);

    let requests = backend.requests();
    assert_eq!(requests.len(), 5);
    let expected = format!("Bearer {ADMIN_TOKEN}");
    assert!(
        requests
            .iter()
            .all(|request| request.authorization.as_deref() == Some(expected.as_str()))
    );
}

#[tokio::test]
async fn test_no_session_sends_nothing() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let moderation = backend.client(&dir.path().join("session.json")).moderation();

    assert_eq!(moderation.list_testimonials().await, Err(ModerationError::NoSession));
    assert_eq!(
        moderation
            .update_contact_message(ContactMessageId::new(11), ProgressStatus::Completed, true)
            .await,
        Err(ModerationError::NoSession)
    );
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_non_admin_token_is_rejected_by_backend() {
    let backend = MockBackend::start().await;
    let (client, _dir) = logged_in(&backend, USER_EMAIL, USER_PASSWORD).await;

    assert_eq!(
        client.moderation().list_users().await,
        Err(ModerationError::Rejected {
            code: 403,
            message: "Admin access required".to_string(),
        })
    );
}

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_approve_sends_single_put() {
    let backend = MockBackend::start().await;
    let (client, _dir) = logged_in(&backend, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let updated = client
        .moderation()
        .set_testimonial_status(TestimonialId::new(5), true)
        .await
        .unwrap();
    assert_eq!(updated.id, TestimonialId::new(5));
    assert_eq!(updated.status, TestimonialStatus::Approved);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let put = requests.first().unwrap();
    assert_eq!(put.method, Method::PUT);
    assert_eq!(put.path, "/api/admin/testimonials/5");
    assert_eq!(put.body, Some(json!({ "status": "approved" })));
    assert_eq!(backend.testimonial(5).unwrap()["status"], "approved");
}

#[tokio::test]
async fn test_unapprove_goes_back_to_pending() {
    let backend = MockBackend::start().await;
    let (client, _dir) = logged_in(&backend, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let updated = client
        .moderation()
        .set_testimonial_status(TestimonialId::new(4), false)
        .await
        .unwrap();
    assert_eq!(updated.status, TestimonialStatus::Pending);
    assert_eq!(
        backend.requests().first().unwrap().body,
        Some(json!({ "status": "pending" }))
    );
}

#[tokio::test]
async fn test_update_contact_message_sends_status_and_flag() {
    let backend = MockBackend::start().await;
    let (client, _dir) = logged_in(&backend, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let updated = client
        .moderation()
        .update_contact_message(ContactMessageId::new(11), ProgressStatus::InProgress, false)
        .await
        .unwrap();
    assert_eq!(updated.status, ProgressStatus::InProgress);
    assert!(!updated.replied);

    let patches = backend.requests_to(&Method::PATCH, "/api/admin/contact-messages/11");
    assert_eq!(patches.len(), 1);
    assert_eq!(
        patches.first().unwrap().body,
        Some(json!({ "status": "in-progress", "replied": false }))
    );
}

#[tokio::test]
async fn test_delete_removes_from_listing() {
    let backend = MockBackend::start().await;
    let (client, _dir) = logged_in(&backend, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let moderation = client.moderation();

    moderation.delete_testimonial(TestimonialId::new(7)).await.unwrap();
    let remaining = moderation.list_testimonials().await.unwrap();
    assert!(remaining.iter().all(|t| t.id != TestimonialId::new(7)));

    let missing = moderation.delete_testimonial(TestimonialId::new(7)).await;
    assert_eq!(
        missing,
        Err(ModerationError::Rejected {
            code: 404,
            message: "Testimonial not found".to_string(),
        })
    );
}

// =============================================================================
// Error classification
// =============================================================================

#[tokio::test]
async fn test_transport_rejection_and_decode_are_distinct() {
    let backend = MockBackend::start().await;
    let (client, _dir) = logged_in(&backend, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let moderation = client.moderation();

    backend.inject(Method::GET, "/api/admin/messages", Fault::DropConnection);
    assert!(matches!(
        moderation.list_contact_messages().await,
        Err(ModerationError::Transport(_))
    ));

    backend.inject(Method::GET, "/api/admin/messages", Fault::Status(500));
    assert_eq!(
        moderation.list_contact_messages().await,
        Err(ModerationError::Rejected {
            code: 500,
            message: "Request failed with status 500".to_string(),
        })
    );

    backend.inject(Method::GET, "/api/admin/messages", Fault::MalformedBody);
    assert!(matches!(
        moderation.list_contact_messages().await,
        Err(ModerationError::Decode(_))
    ));

    backend.clear_faults();
    assert_eq!(moderation.list_contact_messages().await.unwrap().len(), 2);
}
