use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use tempfile::TempDir;
use wiremock::MockServer;

use fashionfiend::api::{ConversationClient, RecommendationClient};
use fashionfiend::session::credentials::{CredentialRecord, MemoryCredentialStore};
use fashionfiend::session::{HttpTokenRefresher, SessionGuard};

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Unsigned JWT carrying `claims` as its payload.
#[allow(dead_code)]
pub fn jwt(claims: serde_json::Value) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

/// Credential record whose access token expires `seconds` from now
/// (negative for the past).
#[allow(dead_code)]
pub fn record_expiring_in(access: &str, refresh: Option<&str>, seconds: i64) -> CredentialRecord {
    CredentialRecord {
        access_token: Some(access.to_string()),
        refresh_token: refresh.map(str::to_string),
        expires_at: Some((Utc::now() + Duration::seconds(seconds)).timestamp_millis()),
    }
}

/// In-memory store seeded with `record`.
#[allow(dead_code)]
pub fn memory_store(record: CredentialRecord) -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_record(
        record,
        Duration::hours(1),
    ))
}

/// Session guard refreshing against `server`.
#[allow(dead_code)]
pub fn guard_for(server: &MockServer, store: Arc<MemoryCredentialStore>) -> Arc<SessionGuard> {
    let refresher = HttpTokenRefresher::new(reqwest::Client::new(), server_url(server));
    Arc::new(SessionGuard::new(store, Arc::new(refresher)))
}

/// Conversation gateway rooted at `server`.
#[allow(dead_code)]
pub fn conversations_for(server: &MockServer, guard: Arc<SessionGuard>) -> Arc<ConversationClient> {
    Arc::new(ConversationClient::new(
        reqwest::Client::new(),
        server_url(server),
        guard,
    ))
}

/// Recommendation gateway rooted at `server`.
#[allow(dead_code)]
pub fn recommendations_for(server: &MockServer) -> Arc<RecommendationClient> {
    Arc::new(RecommendationClient::new(
        reqwest::Client::new(),
        server_url(server),
    ))
}

#[allow(dead_code)]
pub fn server_url(server: &MockServer) -> url::Url {
    url::Url::parse(&server.uri()).expect("mock server uri")
}
