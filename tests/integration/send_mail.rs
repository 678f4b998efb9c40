//! Integration tests for sending through the Gmail API

use super::*;
use base64::Engine;
use integrations_gmail::{
    CredentialStore, FileCredentialStore, GmailClient, OAuth2Error, ReqwestHttpTransport,
    ScriptedPrompt, SendError,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

const SEND_PATH: &str = "/gmail/v1/users/me/messages/send";

fn decode_raw(body: &[u8]) -> String {
    let payload: serde_json::Value = serde_json::from_slice(body).unwrap();
    let raw = base64::engine::general_purpose::URL_SAFE
        .decode(payload["raw"].as_str().unwrap())
        .unwrap();
    String::from_utf8(raw).unwrap()
}

#[tokio::test]
async fn test_first_send_authorizes_and_delivers() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("ya29.int", Some("1//r"))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("authorization", "Bearer ya29.int"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "18e4c0ffee",
            "threadId": "18e4c0ffee",
            "labelIds": ["SENT"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("token.json");
    let prompt = Arc::new(ScriptedPrompt::answering("4/first-run"));
    let client = GmailClient::with_components(
        mock_config(&server),
        &cache,
        Arc::new(ReqwestHttpTransport::new().unwrap()),
        Arc::new(FileCredentialStore::new()),
        prompt.clone(),
    )
    .with_api_base(server.uri());

    let receipt = client
        .send_mail("Me <me@example.com>", "you@example.org", "Report", "All green.")
        .await
        .unwrap();

    assert_eq!(receipt.status, 200);
    assert_eq!(receipt.id.as_deref(), Some("18e4c0ffee"));
    assert_eq!(receipt.label_ids, vec!["SENT"]);
    assert_eq!(prompt.get_requests().len(), 1);
    assert!(cache.exists());

    let requests = server.received_requests().await.unwrap();
    let send = requests
        .iter()
        .find(|r| r.url.path() == SEND_PATH)
        .unwrap();
    let raw = decode_raw(&send.body);
    assert!(raw.starts_with("From: Me <me@example.com>\r\nTo: you@example.org\r\nSubject: Report\r\nDate: "));
    assert!(raw.contains("\r\nMessage-ID: <"));
    assert!(raw.contains("@example.com>\r\n\r\nAll green."));
}

#[tokio::test]
async fn test_send_with_client_secret_file_and_cached_token() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("authorization", "Bearer ya29.cached"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let credentials = dir.path().join("credentials.json");
    std::fs::write(
        &credentials,
        json!({
            "installed": {
                "client_id": "123.apps.googleusercontent.com",
                "client_secret": "shh",
                "auth_uri": format!("{}/o/oauth2/auth", server.uri()),
                "token_uri": format!("{}/token", server.uri()),
                "redirect_uris": ["http://localhost"]
            }
        })
        .to_string(),
    )
    .unwrap();

    let cache = dir.path().join("token.json");
    FileCredentialStore::new()
        .save(&cache, &cached_token("ya29.cached", 3600))
        .await
        .unwrap();

    let client = GmailClient::from_client_secret_file(&credentials, &cache)
        .await
        .unwrap()
        .with_api_base(server.uri());

    let receipt = client
        .send_mail("me@example.com", "you@example.org", "Cached", "")
        .await
        .unwrap();
    assert_eq!(receipt.id.as_deref(), Some("m-1"));
    assert!(receipt.thread_id.is_none());
}

#[tokio::test]
async fn test_rejected_send_surfaces_status() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "code": 401,
                "message": "Request had invalid authentication credentials.",
                "status": "UNAUTHENTICATED"
            }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("token.json");
    FileCredentialStore::new()
        .save(&cache, &cached_token("ya29.revoked", 3600))
        .await
        .unwrap();

    let client = GmailClient::with_components(
        mock_config(&server),
        &cache,
        Arc::new(ReqwestHttpTransport::new().unwrap()),
        Arc::new(FileCredentialStore::new()),
        Arc::new(ScriptedPrompt::new()),
    )
    .with_api_base(server.uri());

    let error = client
        .send_mail("me@example.com", "you@example.org", "Hi", "Body")
        .await
        .unwrap_err();

    match &error {
        OAuth2Error::Send(SendError::Rejected { status, message }) => {
            assert_eq!(*status, 401);
            assert_eq!(message, "Request had invalid authentication credentials.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(error.needs_reauth());
}
