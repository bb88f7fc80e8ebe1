//! Conversation list state
//!
//! A read-through cache of the user's conversations, rebuilt from the
//! server on every refresh. The only local mutation is the optimistic
//! removal on delete, which is rolled back if the server refuses.

use std::sync::Arc;

use crate::api::types::Conversation;
use crate::api::ConversationClient;
use crate::error::ApiError;

/// Number of conversations shown before "show more".
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Cached conversation list with show more / show less paging.
#[derive(Debug)]
pub struct ConversationList {
    client: Arc<ConversationClient>,
    conversations: Vec<Conversation>,
    page_size: usize,
    expanded: bool,
}

impl ConversationList {
    /// Empty list; call [`refresh`](Self::refresh) to populate it.
    pub fn new(client: Arc<ConversationClient>, page_size: usize) -> Self {
        Self {
            client,
            conversations: Vec::new(),
            page_size: page_size.max(1),
            expanded: false,
        }
    }

    /// Replaces the cache with the server's list (most recent first).
    pub async fn refresh(&mut self, user_id: &str) -> Result<(), ApiError> {
        self.conversations = self.client.list(user_id).await?;
        Ok(())
    }

    /// Deletes a conversation, removing it locally first.
    ///
    /// On success the list is refreshed from the server. On failure the
    /// entry is restored at its old position and the error returned.
    pub async fn delete(&mut self, user_id: &str, conversation_id: &str) -> Result<(), ApiError> {
        let removed = self
            .conversations
            .iter()
            .position(|c| c.id == conversation_id)
            .map(|index| (index, self.conversations.remove(index)));

        if let Err(e) = self.client.delete(conversation_id).await {
            if let Some((index, conversation)) = removed {
                self.conversations.insert(index, conversation);
            }
            return Err(e);
        }

        self.refresh(user_id).await
    }

    /// All cached conversations.
    pub fn all(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Conversations currently shown.
    pub fn visible(&self) -> &[Conversation] {
        if self.expanded {
            &self.conversations
        } else {
            let end = self.page_size.min(self.conversations.len());
            &self.conversations[..end]
        }
    }

    /// Returns `true` when some conversations are hidden.
    pub fn has_more(&self) -> bool {
        self.visible().len() < self.conversations.len()
    }

    /// Shows every conversation.
    pub fn show_more(&mut self) {
        self.expanded = true;
    }

    /// Goes back to the first page.
    pub fn show_less(&mut self) {
        self.expanded = false;
    }

    /// Returns `true` when expanded.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }
}
