//! HTTP gateways to the FashionFiend backend
//!
//! # Module Layout
//!
//! - [`conversations`]   -- authenticated conversation and message CRUD
//! - [`recommendations`] -- unauthenticated recommendation queries
//! - [`preview`]         -- product preview images from a link-preview service
//! - [`types`]           -- wire types shared by the gateways

mod envelope;

pub mod conversations;
pub mod preview;
pub mod recommendations;
pub mod types;

pub use conversations::ConversationClient;
pub use preview::{plain_cards, PreviewClient, ProductCard};
pub use recommendations::RecommendationClient;
pub use types::{
    Conversation, Feedback, Message, MessageContent, MessageId, ProductRef, Recommendation, Role,
};

/// Appends path segments to `base`, percent-encoding each one.
///
/// A trailing slash on `base` is ignored, so `http://h/api` and
/// `http://h/api/` resolve identically. `base` must be an `http(s)` URL;
/// configuration validation rejects anything else.
pub(crate) fn join_segments(base: &url::Url, segments: &[&str]) -> url::Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_segments_on_root() {
        let base = url::Url::parse("http://127.0.0.1:8000").expect("url");
        assert_eq!(
            join_segments(&base, &["conversations", "user", "u1"]).as_str(),
            "http://127.0.0.1:8000/conversations/user/u1"
        );
    }

    #[test]
    fn test_join_segments_keeps_prefix() {
        let base = url::Url::parse("http://127.0.0.1:8000/p/bpx").expect("url");
        assert_eq!(
            join_segments(&base, &["conversations"]).as_str(),
            "http://127.0.0.1:8000/p/bpx/conversations"
        );
    }

    #[test]
    fn test_join_segments_encodes_ids() {
        let base = url::Url::parse("http://h/").expect("url");
        assert_eq!(
            join_segments(&base, &["conversations", "a/b c"]).as_str(),
            "http://h/conversations/a%2Fb%20c"
        );
    }
}
