//! Product preview images
//!
//! Looks up an Open Graph image for a product page through a link-preview
//! service (microlink by default). Previews are decoration: every failure
//! yields `None`, and results are never persisted.

use futures::future::join_all;
use serde::Serialize;

use crate::api::types::ProductRef;

/// A product together with its transient preview image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCard {
    /// The product as returned by the recommendation service
    pub product: ProductRef,
    /// Preview image URL, when one could be found
    pub preview_image: Option<String>,
}

/// Client for the link-preview service.
#[derive(Debug, Clone)]
pub struct PreviewClient {
    http: reqwest::Client,
    endpoint: url::Url,
}

impl PreviewClient {
    /// Creates a client for the preview service at `endpoint`.
    pub fn new(http: reqwest::Client, endpoint: url::Url) -> Self {
        Self { http, endpoint }
    }

    /// Preview image for the page at `product_url`.
    pub async fn preview_image(&self, product_url: &str) -> Option<String> {
        if product_url.is_empty() {
            return None;
        }

        let response = match self
            .http
            .get(self.endpoint.clone())
            .query(&[("url", product_url)])
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::debug!(
                    "Preview lookup for {} returned {}",
                    product_url,
                    response.status()
                );
                return None;
            }
            Err(e) => {
                tracing::debug!("Preview lookup for {} failed: {}", product_url, e);
                return None;
            }
        };

        let body: serde_json::Value = response.json().await.ok()?;
        body.pointer("/data/image/url")
            .and_then(|url| url.as_str())
            .map(str::to_string)
    }

    /// Fetches previews for all products concurrently, preserving order.
    pub async fn enrich(&self, products: &[ProductRef]) -> Vec<ProductCard> {
        let images = join_all(products.iter().map(|p| self.preview_image(&p.url))).await;
        products
            .iter()
            .cloned()
            .zip(images)
            .map(|(product, preview_image)| ProductCard {
                product,
                preview_image,
            })
            .collect()
    }
}

/// Product cards without preview lookups.
pub fn plain_cards(products: &[ProductRef]) -> Vec<ProductCard> {
    products
        .iter()
        .cloned()
        .map(|product| ProductCard {
            product,
            preview_image: None,
        })
        .collect()
}
