//! Authenticated conversation gateway
//!
//! Every operation asks the [`SessionGuard`] for a bearer token, issues
//! exactly one HTTP request, and maps non-success statuses to
//! [`ApiError::RequestFailed`]. Nothing here retries: the only implicit
//! retry is the token refresh inside the guard.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde_json::{json, Value};

use crate::api::envelope::unwrap_envelope;
use crate::api::join_segments;
use crate::api::types::{Conversation, Feedback, Message, MessageContent, MessageId, Role};
use crate::error::ApiError;
use crate::session::SessionGuard;

/// Client for the conversation endpoints.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use chrono::Duration;
/// use fashionfiend::api::ConversationClient;
/// use fashionfiend::session::credentials::MemoryCredentialStore;
/// use fashionfiend::session::{HttpTokenRefresher, SessionGuard};
///
/// # async fn example() -> Result<(), fashionfiend::error::ApiError> {
/// let http = reqwest::Client::new();
/// let base = url::Url::parse("http://127.0.0.1:8000").unwrap();
/// let guard = SessionGuard::new(
///     Arc::new(MemoryCredentialStore::new(Duration::hours(1))),
///     Arc::new(HttpTokenRefresher::new(http.clone(), base.clone())),
/// );
/// let client = ConversationClient::new(http, base, Arc::new(guard));
/// for conversation in client.list("user-1").await? {
///     println!("{} {}", conversation.id, conversation.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ConversationClient {
    http: reqwest::Client,
    base_url: url::Url,
    guard: Arc<SessionGuard>,
}

impl ConversationClient {
    /// Creates a client for the conversation API rooted at `base_url`.
    pub fn new(http: reqwest::Client, base_url: url::Url, guard: Arc<SessionGuard>) -> Self {
        Self {
            http,
            base_url,
            guard,
        }
    }

    /// The session guard consulted before every request.
    pub fn guard(&self) -> &Arc<SessionGuard> {
        &self.guard
    }

    /// Creates a conversation named `name` for `user_id`.
    pub async fn create(&self, user_id: &str, name: &str) -> Result<Conversation, ApiError> {
        const OP: &str = "create_conversation";
        let request = self
            .request(Method::POST, &["conversations"])
            .json(&json!({ "user_id": user_id, "name": name }));
        let body = self.send_json(OP, request).await?;
        unwrap_envelope(body, "conversation", OP)
    }

    /// Lists the user's conversations, most recent first.
    ///
    /// The server returns conversations in creation order; the order is
    /// reversed here for display.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Conversation>, ApiError> {
        const OP: &str = "list_conversations";
        let request = self.request(Method::GET, &["conversations", "user", user_id]);
        let body = self.send_json(OP, request).await?;
        let mut conversations: Vec<Conversation> = unwrap_envelope(body, "conversations", OP)?;
        conversations.reverse();
        tracing::debug!("Fetched {} conversations", conversations.len());
        Ok(conversations)
    }

    /// Deletes a conversation.
    pub async fn delete(&self, conversation_id: &str) -> Result<(), ApiError> {
        const OP: &str = "delete_conversation";
        let request = self.request(Method::DELETE, &["conversations", conversation_id]);
        self.send(OP, request).await?;
        Ok(())
    }

    /// Appends a message to a conversation, with empty feedback.
    ///
    /// Returns the stored message when the server echoes it back. A success
    /// status with an empty or unrecognised body still counts as saved and
    /// yields `None`.
    pub async fn add_message(
        &self,
        conversation_id: &str,
        content: &MessageContent,
        role: Role,
    ) -> Result<Option<Message>, ApiError> {
        const OP: &str = "add_message";
        let request = self
            .request(Method::POST, &["conversations", "add", "message"])
            .json(&json!({
                "conversation_id": conversation_id,
                "content": content,
                "role": role,
                "feedback": Feedback::default(),
            }));
        let response = self.send(OP, request).await?;
        let body = match response.json::<Value>().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("{} returned no JSON body: {}", OP, e);
                return Ok(None);
            }
        };
        match unwrap_envelope::<Message>(body, "message", OP) {
            Ok(message) => Ok(Some(message)),
            Err(e) => {
                tracing::debug!("{} saved without echo: {}", OP, e);
                Ok(None)
            }
        }
    }

    /// Lists the messages of a conversation in server order.
    pub async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        const OP: &str = "list_messages";
        let request = self.request(Method::GET, &["conversations", conversation_id, "messages"]);
        let body = self.send_json(OP, request).await?;
        unwrap_envelope(body, "messages", OP)
    }

    /// Records feedback for one message.
    pub async fn submit_feedback(
        &self,
        conversation_id: &str,
        message_id: &MessageId,
        feedback: &Feedback,
    ) -> Result<(), ApiError> {
        const OP: &str = "submit_feedback";
        let message_id = message_id.to_string();
        let request = self
            .request(
                Method::PUT,
                &["conversations", conversation_id, "messages", &message_id],
            )
            .json(&json!({ "feedback": feedback }));
        self.send(OP, request).await?;
        Ok(())
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.http
            .request(method, join_segments(&self.base_url, segments))
    }

    /// Attaches a fresh bearer token, sends, and checks the status.
    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let token = self.guard.ensure_valid_access_token().await?;

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("{} failed with status {}", operation, status);
            return Err(ApiError::RequestFailed {
                operation,
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    async fn send_json(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Value, ApiError> {
        self.send(operation, request)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Decode {
                operation,
                reason: e.to_string(),
            })
    }
}
