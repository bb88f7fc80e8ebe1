//! Chat transcript and question submission
//!
//! A [`ChatSession`] owns the append-only transcript of one chat view.
//! Submitting a question appends the user message immediately, before any
//! network call, and appends the AI answer once the recommendation service
//! responds. Overlapping questions are neither de-duplicated nor ordered:
//! a slow earlier answer can land after a faster later one.
//!
//! Reply tasks are tied to the session's lifetime. Closing or dropping the
//! session cancels them, and a cancelled task never touches the transcript.
//!
//! A bound session keeps the ids the server assigns to saved messages next
//! to the transcript. The transcript itself keeps the local ids; feedback
//! must use the server's.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::api::types::{Message, MessageId, Role};
use crate::api::{ConversationClient, RecommendationClient};
use crate::error::ApiError;

type Transcript = Arc<Mutex<Vec<Message>>>;

/// Server id of each saved message, keyed by local id and role. A question
/// and its answer share a local id.
type SavedIds = Arc<Mutex<HashMap<(MessageId, Role), MessageId>>>;

/// Conversation the session mirrors its messages to.
#[derive(Debug, Clone)]
struct Binding {
    conversation_id: String,
    client: Arc<ConversationClient>,
}

impl Binding {
    /// Posts a message, logging instead of failing. Records the server id
    /// when the reply carries one.
    async fn persist(&self, message: &Message, saved: &SavedIds) {
        match self
            .client
            .add_message(&self.conversation_id, &message.content, message.role)
            .await
        {
            Ok(Some(stored)) => {
                saved
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .insert((message.id.clone(), message.role), stored.id);
            }
            Ok(None) => {
                tracing::debug!(
                    "Saved {} message {} without a server id",
                    message.role,
                    message.id
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to save {} message to conversation {}: {}",
                    message.role,
                    self.conversation_id,
                    e
                );
            }
        }
    }
}

/// Completion handle for one submitted question.
#[derive(Debug)]
pub struct PendingReply {
    question_id: MessageId,
    rx: oneshot::Receiver<Message>,
}

impl PendingReply {
    /// Id of the user message this reply answers.
    pub fn question_id(&self) -> &MessageId {
        &self.question_id
    }

    /// Waits for the AI message to be appended.
    ///
    /// Returns `None` when the session was closed first.
    pub async fn wait(self) -> Option<Message> {
        self.rx.await.ok()
    }
}

/// State of one chat view.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use fashionfiend::api::RecommendationClient;
/// use fashionfiend::chat::ChatSession;
///
/// # async fn example() {
/// let recommendations = Arc::new(RecommendationClient::new(
///     reqwest::Client::new(),
///     url::Url::parse("http://127.0.0.1:8000").unwrap(),
/// ));
/// let session = ChatSession::new(recommendations);
///
/// let pending = session.submit("Shoes for a beach wedding?").unwrap();
/// assert_eq!(session.len(), 1); // user message is already visible
/// let answer = pending.wait().await.unwrap();
/// println!("{}", answer.content.text);
/// # }
/// ```
#[derive(Debug)]
pub struct ChatSession {
    recommendations: Arc<RecommendationClient>,
    binding: Option<Binding>,
    transcript: Transcript,
    saved_ids: SavedIds,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl ChatSession {
    /// Session that is not saved to any conversation.
    pub fn new(recommendations: Arc<RecommendationClient>) -> Self {
        Self {
            recommendations,
            binding: None,
            transcript: Arc::new(Mutex::new(Vec::new())),
            saved_ids: Arc::new(Mutex::new(HashMap::new())),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Session whose messages are also saved to `conversation_id`.
    pub fn bound(
        recommendations: Arc<RecommendationClient>,
        conversation_id: impl Into<String>,
        conversations: Arc<ConversationClient>,
    ) -> Self {
        let mut session = Self::new(recommendations);
        session.binding = Some(Binding {
            conversation_id: conversation_id.into(),
            client: conversations,
        });
        session
    }

    /// Conversation this session saves to, if any.
    pub fn conversation_id(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.conversation_id.as_str())
    }

    /// Snapshot of the transcript in display order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().clone()
    }

    /// Id the server stored `message` under.
    ///
    /// `None` for unbound sessions and for messages whose save failed, is
    /// still in flight, or was acknowledged without an id.
    pub fn saved_id(&self, message: &Message) -> Option<MessageId> {
        self.saved_ids
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(&(message.id.clone(), message.role))
            .cloned()
    }

    /// Number of messages in the transcript.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Loads the bound conversation's messages into an empty transcript.
    ///
    /// Returns the number of messages loaded. Unbound sessions and sessions
    /// that already hold messages load nothing.
    pub async fn load_history(&self) -> Result<usize, ApiError> {
        let Some(binding) = &self.binding else {
            return Ok(0);
        };
        if !self.is_empty() {
            return Ok(0);
        }

        let history = binding
            .client
            .list_messages(&binding.conversation_id)
            .await?;

        let mut transcript = self.lock();
        if !transcript.is_empty() || self.cancel.is_cancelled() {
            return Ok(0);
        }
        let count = history.len();
        {
            let mut saved = self.saved_ids.lock().unwrap_or_else(|p| p.into_inner());
            for message in &history {
                saved.insert((message.id.clone(), message.role), message.id.clone());
            }
        }
        transcript.extend(history);
        tracing::debug!("Loaded {} messages for {}", count, binding.conversation_id);
        Ok(count)
    }

    /// Submits a question.
    ///
    /// The user message is appended before this returns. The recommendation
    /// request runs on a background task that appends the AI message when
    /// it resolves; the returned [`PendingReply`] completes at that point.
    ///
    /// Returns `None` for blank input or a closed session.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, question: &str) -> Option<PendingReply> {
        let question = question.trim();
        if question.is_empty() || self.cancel.is_cancelled() {
            return None;
        }

        let question_id = MessageId::generate();
        let user_message = Message::user(question_id.clone(), question);
        self.lock().push(user_message.clone());
        tracing::debug!("Submitted question {}", question_id);

        let (tx, rx) = oneshot::channel();
        let recommendations = Arc::clone(&self.recommendations);
        let binding = self.binding.clone();
        let transcript = Arc::clone(&self.transcript);
        let saved_ids = Arc::clone(&self.saved_ids);
        let cancel = self.cancel.clone();
        let question = question.to_string();
        let reply_id = question_id.clone();

        self.tracker.spawn(async move {
            let exchange = async {
                let saved = async {
                    if let Some(binding) = &binding {
                        binding.persist(&user_message, &saved_ids).await;
                    }
                };
                let (_, answer) = tokio::join!(saved, recommendations.query(&question));
                answer
            };

            let answer = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Reply {} cancelled before completion", reply_id);
                    return;
                }
                answer = exchange => answer,
            };

            let id = answer.message_id.clone().unwrap_or(reply_id);
            let ai_message = Message::ai(id, answer.into_content());
            {
                let mut transcript = transcript.lock().unwrap_or_else(|p| p.into_inner());
                if cancel.is_cancelled() {
                    return;
                }
                transcript.push(ai_message.clone());
            }
            let _ = tx.send(ai_message.clone());

            if let Some(binding) = &binding {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = binding.persist(&ai_message, &saved_ids) => {}
                }
            }
        });

        Some(PendingReply { question_id, rx })
    }

    /// Cancels outstanding replies. Later answers are discarded.
    pub fn close(&self) {
        self.cancel.cancel();
        self.tracker.close();
    }

    /// Waits for outstanding replies and their saves without cancelling
    /// them. The session stays open.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Closes the session and waits for its tasks to finish.
    pub async fn shutdown(&self) {
        self.close();
        self.tracker.wait().await;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Message>> {
        self.transcript
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn recommendations_for(server: &MockServer) -> Arc<RecommendationClient> {
        Arc::new(RecommendationClient::new(
            reqwest::Client::new(),
            url::Url::parse(&server.uri()).expect("url"),
        ))
    }

    async fn slow_recommendation_server(delay: Duration) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recommendations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "recommendation_text": "Try espadrilles.",
                        "products": [{"name": "Espadrilles", "url": "https://shop/e"}]
                    }))
                    .set_delay(delay),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_user_message_is_appended_before_reply() {
        let server = slow_recommendation_server(Duration::from_millis(200)).await;
        let session = ChatSession::new(recommendations_for(&server));

        let pending = session.submit("  Q1  ").expect("pending");
        let messages = session.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content.text, "Q1");
        assert_eq!(&messages[0].id, pending.question_id());

        let question_id = pending.question_id().clone();
        let reply = pending.wait().await.expect("reply");
        assert_eq!(reply.role, Role::Ai);
        assert_eq!(reply.id, question_id);
        assert_eq!(reply.content.products.len(), 1);

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], reply);
    }

    #[tokio::test]
    async fn test_blank_question_is_ignored() {
        let server = MockServer::start().await;
        let session = ChatSession::new(recommendations_for(&server));
        assert!(session.submit("   ").is_none());
        assert!(session.is_empty());
    }

    #[tokio::test]
    async fn test_closed_session_discards_late_reply() {
        let server = slow_recommendation_server(Duration::from_millis(300)).await;
        let session = ChatSession::new(recommendations_for(&server));

        let pending = session.submit("Q1").expect("pending");
        session.close();

        assert!(pending.wait().await.is_none());
        session.shutdown().await;
        assert_eq!(session.len(), 1);
        assert!(session.submit("Q2").is_none());
    }

    #[tokio::test]
    async fn test_failed_query_still_appends_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let session = ChatSession::new(recommendations_for(&server));

        let reply = session.submit("Q").expect("pending").wait().await.expect("reply");
        assert_eq!(
            reply.content.text,
            "Sorry, something went wrong. Please try again later."
        );
        assert_eq!(session.len(), 2);
    }

    #[tokio::test]
    async fn test_server_echoed_id_wins() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "recommendation_text": "ok",
                "products": [],
                "message_id": "srv-1"
            })))
            .mount(&server)
            .await;
        let session = ChatSession::new(recommendations_for(&server));

        let reply = session.submit("Q").expect("pending").wait().await.expect("reply");
        assert_eq!(reply.id, MessageId::Text("srv-1".to_string()));
    }
}
