//! Integration tests for caching, acquisition, and refresh

use super::*;
use integrations_gmail::{
    AuthorizationCodeAcquirer, AuthorizationError, CredentialStore, FileCredentialStore,
    OAuth2Error, ReqwestHttpTransport, ScriptedPrompt, TokenManager, TokenManagerConfig,
    TokenSource,
};
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

type Manager = TokenManager<
    ReqwestHttpTransport,
    FileCredentialStore,
    AuthorizationCodeAcquirer<ReqwestHttpTransport, ScriptedPrompt>,
>;

fn manager(prompt: Arc<ScriptedPrompt>) -> Manager {
    let transport = Arc::new(ReqwestHttpTransport::new().expect("transport"));
    let acquirer = Arc::new(AuthorizationCodeAcquirer::new(transport.clone(), prompt));
    TokenManager::new(transport, Arc::new(FileCredentialStore::new()), acquirer)
}

async fn mount_code_exchange(server: &wiremock::MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=4%2Fintegration-code"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body("ya29.acquired", Some("1//new"))),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_missing_cache_acquires_once_and_persists() {
    let server = setup_mock_server().await;
    mount_code_exchange(&server, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("token.json");
    let prompt = Arc::new(ScriptedPrompt::answering("4/integration-code"));
    let manager = manager(prompt.clone());
    let config = mock_config(&server);

    let ctx = manager.get_authorized_context(&config, &cache).await.unwrap();
    assert_eq!(ctx.source(), TokenSource::Acquired);
    assert_eq!(ctx.access_token().await.unwrap().secret(), "ya29.acquired");

    let saved = FileCredentialStore::new().load(&cache).await.unwrap();
    assert_eq!(saved, ctx.token().await);

    let ctx = manager.get_authorized_context(&config, &cache).await.unwrap();
    assert_eq!(ctx.source(), TokenSource::Cache);
    assert_eq!(prompt.get_requests().len(), 1);

    let url = &prompt.get_requests()[0].authorization_url;
    assert!(url.starts_with(&format!("{}/o/oauth2/auth?", server.uri())));
    assert!(url.contains("access_type=offline"));
}

#[tokio::test]
async fn test_corrupted_cache_triggers_acquisition() {
    let server = setup_mock_server().await;
    mount_code_exchange(&server, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("token.json");
    std::fs::write(&cache, "{\"access_token\": ").unwrap();

    let manager = manager(Arc::new(ScriptedPrompt::answering("4/integration-code")));
    let ctx = manager
        .get_authorized_context(&mock_config(&server), &cache)
        .await
        .unwrap();

    assert_eq!(ctx.source(), TokenSource::Acquired);
    let saved = FileCredentialStore::new().load(&cache).await.unwrap();
    assert_eq!(saved.access_token, "ya29.acquired");
}

#[tokio::test]
async fn test_expired_cached_token_refreshes_without_prompt() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=1%2F%2Fcached-refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("ya29.refreshed", None)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("token.json");
    let stale = cached_token("ya29.stale", -300);
    FileCredentialStore::new().save(&cache, &stale).await.unwrap();

    let prompt = Arc::new(ScriptedPrompt::new());
    let manager = manager(prompt.clone());
    let ctx = manager
        .get_authorized_context(&mock_config(&server), &cache)
        .await
        .unwrap();

    assert_eq!(ctx.source(), TokenSource::Cache);
    assert_eq!(ctx.access_token().await.unwrap().secret(), "ya29.refreshed");
    assert_eq!(
        ctx.token().await.refresh_token.as_deref(),
        Some("1//cached-refresh")
    );
    assert!(prompt.get_requests().is_empty());

    // Refreshed tokens stay in memory only.
    let on_disk = FileCredentialStore::new().load(&cache).await.unwrap();
    assert_eq!(on_disk, stale);
}

#[tokio::test]
async fn test_failed_save_still_returns_usable_context() {
    let server = setup_mock_server().await;
    mount_code_exchange(&server, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("no-such-dir").join("token.json");

    let manager = manager(Arc::new(ScriptedPrompt::answering("4/integration-code")));
    let ctx = manager
        .get_authorized_context(&mock_config(&server), &cache)
        .await
        .unwrap();

    assert_eq!(ctx.access_token().await.unwrap().secret(), "ya29.acquired");
    assert!(!Path::new(&cache).exists());
}

#[tokio::test]
async fn test_rejected_code_is_fatal() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Malformed auth code."
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("token.json");

    let manager = manager(Arc::new(ScriptedPrompt::answering("garbage")));
    let result = manager
        .get_authorized_context(&mock_config(&server), &cache)
        .await;

    let error = result.unwrap_err();
    assert!(error.needs_reauth());
    assert!(!cache.exists());
}

#[tokio::test]
async fn test_closed_prompt_aborts() {
    let server = setup_mock_server().await;
    mount_code_exchange(&server, 0).await;

    let dir = tempfile::tempdir().unwrap();
    let manager = manager(Arc::new(ScriptedPrompt::new()));
    let result = manager
        .get_authorized_context(&mock_config(&server), &dir.path().join("token.json"))
        .await;

    assert!(matches!(
        result,
        Err(OAuth2Error::Authorization(AuthorizationError::UserAbort { .. }))
    ));
}

#[tokio::test]
async fn test_scope_drift_reacquires_when_verified() {
    let server = setup_mock_server().await;
    mount_code_exchange(&server, 1).await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("token.json");
    let mut narrow = cached_token("ya29.narrow", 3600);
    narrow.scope = Some(scopes::GMAIL_SEND.to_string());
    FileCredentialStore::new().save(&cache, &narrow).await.unwrap();

    let manager = manager(Arc::new(ScriptedPrompt::answering("4/integration-code")))
        .with_config(TokenManagerConfig {
            verify_scopes: true,
            ..Default::default()
        });
    let ctx = manager
        .get_authorized_context(&mock_config(&server), &cache)
        .await
        .unwrap();

    assert_eq!(ctx.source(), TokenSource::Acquired);
    let saved = FileCredentialStore::new().load(&cache).await.unwrap();
    assert_eq!(saved.access_token, "ya29.acquired");
}
