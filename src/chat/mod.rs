//! UI-facing state built on the gateways
//!
//! - [`session`] -- transcript of one chat view
//! - [`sidebar`] -- cached conversation list

pub mod session;
pub mod sidebar;

pub use session::{ChatSession, PendingReply};
pub use sidebar::ConversationList;
