//! Conversation gateway integration tests
//!
//! Every conversation call goes through the session guard. These tests pin
//! the observable contract:
//!
//! - requests carry `Authorization: Bearer <token>`
//! - an expired token is refreshed before the request, never after
//! - a non-success status is reported once, without retrying or refreshing
//! - a failed refresh stops the request from being sent at all

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fashionfiend::api::{ConversationClient, MessageId, Role};
use fashionfiend::error::{ApiError, AuthError};

mod common;

fn logged_in_client(server: &MockServer) -> std::sync::Arc<ConversationClient> {
    let store = common::memory_store(common::record_expiring_in("A", Some("R"), 300));
    common::conversations_for(server, common::guard_for(server, store))
}

#[tokio::test]
async fn test_list_sends_bearer_and_reverses_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations/user/u1"))
        .and(header("authorization", "Bearer A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"conversations": [
                {"_id": "c1", "name": "First"},
                {"_id": "c2", "name": "Second"},
                {"_id": "c3", "name": "Third", "createdAt": "2024-05-01T10:00:00Z"}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let conversations = logged_in_client(&server).list("u1").await.unwrap();
    let ids: Vec<&str> = conversations.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c3", "c2", "c1"]);
    assert_eq!(
        conversations[0].created_at.as_deref(),
        Some("2024-05-01T10:00:00Z")
    );
}

#[tokio::test]
async fn test_delete_not_found_is_request_failed() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/conversations/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = logged_in_client(&server).delete("missing").await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::RequestFailed {
            operation: "delete_conversation",
            status: 404
        }
    ));
    assert!(!err.is_session_fatal());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"access_token": "A2", "refresh_token": "R2"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/conversations/c1/messages"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"messages": [
                {"_id": 1700000000000i64, "role": "user", "content": {"message": "Q"}},
                {"_id": "m2", "role": "ai", "content": {"message": "A", "products": [
                    {"name": "Loafers", "url": null, "category": "Footwear"}
                ]}}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = common::memory_store(common::record_expiring_in("A", Some("R"), -10));
    let client = common::conversations_for(&server, common::guard_for(&server, store.clone()));

    let messages = client.list_messages("c1").await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, MessageId::Number(1_700_000_000_000));
    assert_eq!(messages[1].role, Role::Ai);
    assert_eq!(messages[1].content.products[0].url, "");
    assert_eq!(store.snapshot().refresh_token.as_deref(), Some("R2"));
}

#[tokio::test]
async fn test_unauthorized_response_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"access_token": "A2", "refresh_token": "R2"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/conversations/user/u1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let store = common::memory_store(common::record_expiring_in("A", Some("R"), -10));
    let client = common::conversations_for(&server, common::guard_for(&server, store));

    let err = client.list("u1").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_failed_refresh_skips_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token/refresh"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/conversations"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let store = common::memory_store(common::record_expiring_in("A", Some("R"), -10));
    let client = common::conversations_for(&server, common::guard_for(&server, store.clone()));

    let err = client.create("u1", "Winter").await.unwrap_err();
    assert!(err.is_session_fatal());
    match err {
        ApiError::Auth(AuthError::RefreshFailed { reason }) => {
            assert!(reason.contains("Failed to refresh token"), "reason: {reason}");
        }
        other => panic!("expected refresh failure, got {other:?}"),
    }
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_prefixed_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/bpx/conversations/user/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let store = common::memory_store(common::record_expiring_in("A", Some("R"), 300));
    let guard = common::guard_for(&server, store);
    let base = url::Url::parse(&format!("{}/p/bpx", server.uri())).unwrap();
    let client = ConversationClient::new(reqwest::Client::new(), base, guard);

    assert!(client.list("u1").await.unwrap().is_empty());
}
