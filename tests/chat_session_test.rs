//! Chat session integration tests
//!
//! - a bound session posts both the question and the answer to its
//!   conversation
//! - feedback on an answer uses the id the server stored it under
//! - overlapping questions all get answers, in completion order
//! - history loads into an empty transcript only

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fashionfiend::api::{Feedback, MessageId, Role};
use fashionfiend::chat::ChatSession;

mod common;

fn answer(text: &str) -> serde_json::Value {
    json!({"recommendation_text": text, "products": []})
}

#[tokio::test]
async fn test_bound_session_persists_question_and_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("Try a linen suit.")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/conversations/add/message"))
        .and(body_partial_json(json!({
            "conversation_id": "c1",
            "role": "user",
            "content": {"message": "Summer wedding?"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/conversations/add/message"))
        .and(body_partial_json(json!({
            "conversation_id": "c1",
            "role": "ai",
            "content": {"message": "Try a linen suit."}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let store = common::memory_store(common::record_expiring_in("A", Some("R"), 300));
    let conversations = common::conversations_for(&server, common::guard_for(&server, store));
    let session = ChatSession::bound(common::recommendations_for(&server), "c1", conversations);
    assert_eq!(session.conversation_id(), Some("c1"));

    let reply = session
        .submit("Summer wedding?")
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(reply.content.text, "Try a linen suit.");

    session.settle().await;
    let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, [Role::User, Role::Ai]);
    assert_eq!(session.saved_id(&reply), None);
}

#[tokio::test]
async fn test_feedback_targets_server_assigned_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("A navy blazer.")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/conversations/add/message"))
        .and(body_partial_json(json!({"role": "user"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"_id": "srv-user", "role": "user", "content": {"message": "Q"}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/conversations/add/message"))
        .and(body_partial_json(json!({"role": "ai"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"_id": "srv-ai", "role": "ai", "content": {"message": "A navy blazer."}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/conversations/c1/messages/srv-ai"))
        .and(body_json(json!({
            "feedback": {"upvote": true, "downvote": false, "text": "spot on"}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = common::memory_store(common::record_expiring_in("A", Some("R"), 300));
    let conversations = common::conversations_for(&server, common::guard_for(&server, store));
    let session = ChatSession::bound(
        common::recommendations_for(&server),
        "c1",
        conversations.clone(),
    );

    let reply = session.submit("Q").unwrap().wait().await.unwrap();
    session.settle().await;

    let messages = session.messages();
    assert_eq!(messages[0].id, reply.id);
    assert_eq!(
        session.saved_id(&messages[0]),
        Some(MessageId::Text("srv-user".to_string()))
    );
    let answer_id = session.saved_id(&reply).expect("answer saved");
    assert_eq!(answer_id, MessageId::Text("srv-ai".to_string()));

    conversations
        .submit_feedback("c1", &answer_id, &Feedback::upvote("spot on"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_save_does_not_block_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("Chelsea boots.")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/conversations/add/message"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let store = common::memory_store(common::record_expiring_in("A", Some("R"), 300));
    let conversations = common::conversations_for(&server, common::guard_for(&server, store));
    let session = ChatSession::bound(common::recommendations_for(&server), "c1", conversations);

    let reply = session.submit("Boots?").unwrap().wait().await.unwrap();
    assert_eq!(reply.content.text, "Chelsea boots.");
    session.settle().await;
    assert_eq!(session.len(), 2);
}

#[tokio::test]
async fn test_overlapping_questions_land_in_completion_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .and(body_json(json!({"query": "slow"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(answer("slow answer"))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .and(body_json(json!({"query": "fast"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("fast answer")))
        .mount(&server)
        .await;

    let session = ChatSession::new(common::recommendations_for(&server));
    let slow = session.submit("slow").unwrap();
    let fast = session.submit("fast").unwrap();
    assert_eq!(session.len(), 2);

    let fast_reply = fast.wait().await.unwrap();
    let slow_reply = slow.wait().await.unwrap();
    assert_eq!(fast_reply.content.text, "fast answer");
    assert_eq!(slow_reply.content.text, "slow answer");

    let texts: Vec<String> = session
        .messages()
        .into_iter()
        .map(|m| m.content.text)
        .collect();
    assert_eq!(texts, ["slow", "fast", "fast answer", "slow answer"]);
}

#[tokio::test]
async fn test_load_history_fills_empty_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/conversations/c1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"messages": [
                {"_id": "m1", "role": "user", "content": {"message": "Hi"}},
                {"_id": "m2", "role": "ai", "content": {"message": "Hello!"}}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = common::memory_store(common::record_expiring_in("A", Some("R"), 300));
    let conversations = common::conversations_for(&server, common::guard_for(&server, store));
    let session = ChatSession::bound(common::recommendations_for(&server), "c1", conversations);

    assert_eq!(session.load_history().await.unwrap(), 2);
    assert_eq!(session.load_history().await.unwrap(), 0);
    assert_eq!(session.len(), 2);

    let answer = &session.messages()[1];
    assert_eq!(
        session.saved_id(answer),
        Some(MessageId::Text("m2".to_string()))
    );
}

#[tokio::test]
async fn test_unbound_session_has_no_history() {
    let server = MockServer::start().await;
    let session = ChatSession::new(common::recommendations_for(&server));
    assert_eq!(session.conversation_id(), None);
    assert_eq!(session.load_history().await.unwrap(), 0);
}
