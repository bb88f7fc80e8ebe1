//! Response envelope unwrapping
//!
//! The conversation endpoints are not uniform: some wrap the payload as
//! `{"data": {"<key>": payload}}`, some as `{"data": payload}`, and some
//! return it bare. [`unwrap_envelope`] tries those shapes in that order.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// Decodes `T` from the first envelope shape that fits.
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(
    body: Value,
    key: &str,
    operation: &'static str,
) -> Result<T, ApiError> {
    let mut candidates = Vec::with_capacity(3);
    if let Some(data) = body.get("data") {
        if let Some(inner) = data.get(key) {
            candidates.push(inner.clone());
        }
        candidates.push(data.clone());
    }
    candidates.push(body);

    let mut last_error = None;
    for candidate in candidates {
        match serde_json::from_value::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }

    Err(ApiError::Decode {
        operation,
        reason: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "empty body".to_string()),
    })
}
