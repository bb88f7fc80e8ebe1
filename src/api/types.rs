//! Wire types shared by the conversation and recommendation endpoints
//!
//! Field names follow the backend: ids arrive as `_id`, message text as
//! `content.message`, and the recommendation answer as
//! `recommendation_text`.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions
    User,
    /// The recommendation assistant
    #[serde(alias = "assistant")]
    Ai,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Ai => "ai",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message identifier. Client-generated ids are epoch milliseconds; server
/// ids are strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    /// Numeric id, usually client-generated
    Number(i64),
    /// Server-assigned id
    Text(String),
}

impl MessageId {
    /// New client-side id from the current wall-clock time.
    pub fn generate() -> Self {
        MessageId::Number(Utc::now().timestamp_millis())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Number(n) => write!(f, "{n}"),
            MessageId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        MessageId::Text(value.to_string())
    }
}

/// A product suggested alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    /// Display name
    pub name: String,

    /// Product page; empty when the backend has none
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,

    /// Catalogue category, when the backend provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Free-form catalogue attributes
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ProductRef {
    /// Product with just a name and URL.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category: None,
            metadata: serde_json::Map::new(),
        }
    }
}

/// Body of a message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageContent {
    /// Message text (markdown for AI answers)
    #[serde(rename = "message", alias = "text", default, deserialize_with = "null_as_empty")]
    pub text: String,

    /// Products attached to an AI answer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<ProductRef>,
}

impl MessageContent {
    /// Text-only content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            products: Vec::new(),
        }
    }
}

/// One entry of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Server or client id
    #[serde(rename = "_id", alias = "id")]
    pub id: MessageId,

    /// Author
    pub role: Role,

    /// Text and products
    pub content: MessageContent,
}

impl Message {
    /// User message with text only.
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: MessageContent::text(text),
        }
    }

    /// AI message.
    pub fn ai(id: MessageId, content: MessageContent) -> Self {
        Self {
            id,
            role: Role::Ai,
            content,
        }
    }
}

/// A named thread of messages owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Server id
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    /// Display name
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    /// Creation timestamp as sent by the server, if it is a string
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "string_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
}

/// Per-message rating. New messages are posted with the default (all
/// unset) value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Feedback {
    /// Thumbs up
    #[serde(default)]
    pub upvote: bool,
    /// Thumbs down
    #[serde(default)]
    pub downvote: bool,
    /// Free-text comment
    #[serde(default)]
    pub text: String,
}

impl Feedback {
    /// Positive rating with an optional comment.
    pub fn upvote(text: impl Into<String>) -> Self {
        Self {
            upvote: true,
            downvote: false,
            text: text.into(),
        }
    }

    /// Negative rating with an optional comment.
    pub fn downvote(text: impl Into<String>) -> Self {
        Self {
            upvote: false,
            downvote: true,
            text: text.into(),
        }
    }
}

/// Answer to a recommendation query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Answer text (markdown)
    #[serde(rename = "recommendation_text")]
    pub answer_text: String,

    /// Suggested products
    #[serde(default)]
    pub products: Vec<ProductRef>,

    /// Server-echoed message id, if any
    #[serde(default, alias = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<MessageId>,
}

impl Recommendation {
    /// Text shown whenever the recommendation service fails.
    pub const FALLBACK_TEXT: &'static str = "Sorry, something went wrong. Please try again later.";

    /// The renderable stand-in for a failed query.
    pub fn fallback() -> Self {
        Self {
            answer_text: Self::FALLBACK_TEXT.to_string(),
            products: Vec::new(),
            message_id: None,
        }
    }

    /// Returns `true` for the fallback answer.
    pub fn is_fallback(&self) -> bool {
        self.answer_text == Self::FALLBACK_TEXT && self.products.is_empty()
    }

    /// Converts the answer into message content.
    pub fn into_content(self) -> MessageContent {
        MessageContent {
            text: self.answer_text,
            products: self.products,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_decodes_backend_shape() {
        let message: Message = serde_json::from_value(json!({
            "_id": "65f0c1",
            "role": "ai",
            "content": {
                "message": "Try a linen shirt.",
                "products": [{"name": "Linen Shirt", "url": "https://shop/1", "category": "Topwear"}]
            },
            "feedback": {"upvote": false, "downvote": false, "text": ""}
        }))
        .expect("decode");

        assert_eq!(message.id, MessageId::Text("65f0c1".to_string()));
        assert_eq!(message.role, Role::Ai);
        assert_eq!(message.content.text, "Try a linen shirt.");
        assert_eq!(message.content.products[0].category.as_deref(), Some("Topwear"));
    }

    #[test]
    fn test_message_id_accepts_numbers() {
        let message: Message = serde_json::from_value(json!({
            "id": 1_700_000_000_000i64,
            "role": "user",
            "content": {"message": "hi"}
        }))
        .expect("decode");
        assert_eq!(message.id, MessageId::Number(1_700_000_000_000));
        assert!(message.content.products.is_empty());
    }

    #[test]
    fn test_product_null_url_is_empty() {
        let product: ProductRef =
            serde_json::from_value(json!({"name": "Scarf", "url": null})).expect("decode");
        assert_eq!(product.url, "");
        assert!(product.metadata.is_empty());
    }

    #[test]
    fn test_conversation_tolerates_non_string_created_at() {
        let conversation: Conversation = serde_json::from_value(json!({
            "_id": "c1",
            "name": "Summer outfits",
            "createdAt": {"$date": 1}
        }))
        .expect("decode");
        assert_eq!(conversation.id, "c1");
        assert_eq!(conversation.created_at, None);
    }

    #[test]
    fn test_content_serializes_text_as_message() {
        let value = serde_json::to_value(MessageContent::text("hello")).expect("encode");
        assert_eq!(value, json!({"message": "hello"}));
    }

    #[test]
    fn test_recommendation_decodes_and_converts() {
        let rec: Recommendation = serde_json::from_value(json!({
            "recommendation_text": "Here are some ideas",
            "products": [{"name": "Boots", "url": "https://shop/boots"}]
        }))
        .expect("decode");
        assert!(!rec.is_fallback());
        let content = rec.into_content();
        assert_eq!(content.text, "Here are some ideas");
        assert_eq!(content.products, vec![ProductRef::new("Boots", "https://shop/boots")]);
    }

    #[test]
    fn test_fallback_recommendation() {
        let rec = Recommendation::fallback();
        assert_eq!(
            rec.answer_text,
            "Sorry, something went wrong. Please try again later."
        );
        assert!(rec.products.is_empty());
        assert!(rec.is_fallback());
    }

    #[test]
    fn test_role_accepts_assistant_alias() {
        let role: Role = serde_json::from_value(json!("assistant")).expect("decode");
        assert_eq!(role, Role::Ai);
        assert_eq!(serde_json::to_value(Role::Ai).expect("encode"), json!("ai"));
    }
}
