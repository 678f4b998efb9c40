//! Integration tests using WireMock
//!
//! These tests drive the real reqwest transport against a mock token endpoint
//! and a mock Gmail API, with the token cache on disk.

mod send_mail;
mod token_lifecycle;

use integrations_gmail::{oauth2_config, scopes, OAuth2Config, Token};
use wiremock::MockServer;

/// Helper to create a mock server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Configuration whose endpoints point at the mock server.
pub fn mock_config(server: &MockServer) -> OAuth2Config {
    oauth2_config()
        .client_id("integration-client")
        .client_secret("integration-secret")
        .authorization_endpoint(format!("{}/o/oauth2/auth", server.uri()))
        .token_endpoint(format!("{}/token", server.uri()))
        .scopes(scopes::send_scopes())
        .build()
        .expect("valid mock configuration")
}

/// Token endpoint success body.
pub fn token_body(access_token: &str, refresh_token: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3599,
        "scope": scopes::send_scopes().join(" "),
    });
    if let Some(refresh_token) = refresh_token {
        body["refresh_token"] = refresh_token.into();
    }
    body
}

/// Token record as another OAuth2 client would have written it.
pub fn cached_token(access_token: &str, expires_in_secs: i64) -> Token {
    Token {
        access_token: access_token.to_string(),
        token_type: "Bearer".to_string(),
        refresh_token: Some("1//cached-refresh".to_string()),
        expiry: Some(chrono::Utc::now() + chrono::Duration::seconds(expires_in_secs)),
        scope: None,
    }
}
