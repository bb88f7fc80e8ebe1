//! Recommendation gateway
//!
//! Queries are unauthenticated. [`RecommendationClient::query`] never
//! fails: transport errors, non-success statuses and malformed bodies all
//! become [`Recommendation::fallback`], so the chat transcript always gets a
//! renderable answer.

use serde::Serialize;
use thiserror::Error;

use crate::api::join_segments;
use crate::api::types::Recommendation;

/// Why a query fell back. Logged, never returned to callers.
#[derive(Error, Debug)]
enum RecommendationError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("service returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// Client for `POST /recommendations`.
#[derive(Debug, Clone)]
pub struct RecommendationClient {
    http: reqwest::Client,
    endpoint: url::Url,
}

impl RecommendationClient {
    /// Creates a client for the recommendation service rooted at `base_url`.
    pub fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        let endpoint = join_segments(&base_url, &["recommendations"]);
        Self { http, endpoint }
    }

    /// Asks the service for an answer to `text`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fashionfiend::api::RecommendationClient;
    ///
    /// # async fn example() {
    /// let client = RecommendationClient::new(
    ///     reqwest::Client::new(),
    ///     url::Url::parse("http://127.0.0.1:8000").unwrap(),
    /// );
    /// let answer = client.query("What should I wear to a summer wedding?").await;
    /// println!("{}", answer.answer_text);
    /// # }
    /// ```
    pub async fn query(&self, text: &str) -> Recommendation {
        match self.try_query(text).await {
            Ok(recommendation) => {
                tracing::debug!(
                    "Recommendation received with {} products",
                    recommendation.products.len()
                );
                recommendation
            }
            Err(e) => {
                tracing::warn!("Recommendation query failed, using fallback answer: {}", e);
                Recommendation::fallback()
            }
        }
    }

    async fn try_query(&self, text: &str) -> Result<Recommendation, RecommendationError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&QueryRequest { query: text })
            .send()
            .await
            .map_err(RecommendationError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecommendationError::Status(status.as_u16()));
        }

        response
            .json::<Recommendation>()
            .await
            .map_err(RecommendationError::Decode)
    }
}
