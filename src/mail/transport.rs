//! Gmail Transport
//!
//! `users.messages.send` with a base64url `raw` payload.

use base64::Engine;
use serde::Deserialize;
use tracing::{info, warn};

use crate::core::{HttpRequest, HttpTransport};
use crate::error::{OAuth2Error, ProtocolError, SendError};
use crate::mail::MailMessage;
use crate::token::AuthorizedContext;

/// Public Gmail API base URL.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com";

/// Outcome of a successful send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendReceipt {
    /// HTTP status of the send call.
    pub status: u16,
    /// Id of the created message.
    pub id: Option<String>,
    pub thread_id: Option<String>,
    pub label_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    thread_id: Option<String>,
    #[serde(default)]
    label_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Gmail send client.
#[derive(Clone, Debug)]
pub struct GmailTransport {
    base_url: String,
}

impl Default for GmailTransport {
    fn default() -> Self {
        Self::new(GMAIL_API_BASE)
    }
}

impl GmailTransport {
    /// Create a transport against `base_url` (scheme and host, no path).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn send_url(&self) -> String {
        format!("{}/gmail/v1/users/me/messages/send", self.base_url)
    }

    /// Render `message` and send it as the authorized user.
    pub async fn send<T: HttpTransport>(
        &self,
        context: &AuthorizedContext<T>,
        message: &MailMessage,
    ) -> Result<SendReceipt, OAuth2Error> {
        let raw = message.render()?;
        self.send_raw(context, &raw).await
    }

    /// Send an already rendered RFC 5322 message.
    pub async fn send_raw<T: HttpTransport>(
        &self,
        context: &AuthorizedContext<T>,
        raw: &str,
    ) -> Result<SendReceipt, OAuth2Error> {
        let encoded = base64::engine::general_purpose::URL_SAFE.encode(raw.as_bytes());
        let request = HttpRequest::json_post(self.send_url(), &serde_json::json!({ "raw": encoded }))
            .with_timeout(context.config().timeout);

        let response = context.send(request).await?;

        if !response.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&response.body)
                .map(|b| b.error.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| response.body.clone());
            warn!(status = response.status, error = %message, "Message send rejected");
            return Err(SendError::Rejected {
                status: response.status,
                message,
            }
            .into());
        }

        let sent: SentMessage =
            serde_json::from_str(&response.body).map_err(|e| ProtocolError::InvalidJson {
                message: e.to_string(),
            })?;

        info!(
            status = response.status,
            id = sent.id.as_deref().unwrap_or(""),
            "Message sent"
        );

        Ok(SendReceipt {
            status: response.status,
            id: sent.id,
            thread_id: sent.thread_id,
            label_ids: sent.label_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::oauth2_config;
    use crate::core::MockHttpTransport;
    use crate::token::TokenSource;
    use crate::types::Token;
    use std::sync::Arc;
    use std::time::Duration;

    fn context(transport: Arc<MockHttpTransport>) -> AuthorizedContext<MockHttpTransport> {
        let config = oauth2_config()
            .client_id("client")
            .client_secret("secret")
            .authorization_endpoint("https://example.com/auth")
            .token_endpoint("https://example.com/token")
            .build()
            .unwrap();
        let token = Token {
            access_token: "ya29.send".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            expiry: None,
            scope: None,
        };
        AuthorizedContext::new(config, transport, token, TokenSource::Cache, Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_send_posts_raw_message() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(
            200,
            serde_json::json!({"id": "18c1", "threadId": "18c1", "labelIds": ["SENT"]}),
        );
        let ctx = context(transport.clone());

        let receipt = GmailTransport::new("https://gmail.example.com/")
            .send(&ctx, &MailMessage::new("a@example.com", "b@example.com", "Hi", "Body"))
            .await
            .unwrap();
        assert_eq!(receipt.status, 200);
        assert_eq!(receipt.id.as_deref(), Some("18c1"));
        assert_eq!(receipt.label_ids, vec!["SENT"]);

        let request = transport.get_last_request().unwrap();
        assert_eq!(request.url, "https://gmail.example.com/gmail/v1/users/me/messages/send");
        assert_eq!(request.header("authorization"), Some("Bearer ya29.send"));

        let payload: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        let raw = base64::engine::general_purpose::URL_SAFE
            .decode(payload["raw"].as_str().unwrap())
            .unwrap();
        let raw = String::from_utf8(raw).unwrap();
        assert!(raw.starts_with("From: a@example.com\r\nTo: b@example.com\r\nSubject: Hi\r\n"));
        assert!(raw.ends_with("\r\n\r\nBody"));
    }

    #[tokio::test]
    async fn test_rejected_send() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.queue_json_response(
            403,
            serde_json::json!({"error": {"code": 403, "message": "Insufficient Permission"}}),
        );
        let ctx = context(transport);

        let result = GmailTransport::default()
            .send(&ctx, &MailMessage::new("a@example.com", "b@example.com", "Hi", ""))
            .await;
        match result {
            Err(OAuth2Error::Send(SendError::Rejected { status, message })) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Insufficient Permission");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_message_is_not_sent() {
        let transport = Arc::new(MockHttpTransport::new());
        let ctx = context(transport.clone());

        let result = GmailTransport::default()
            .send(&ctx, &MailMessage::new("", "b@example.com", "Hi", ""))
            .await;
        assert!(matches!(result, Err(OAuth2Error::Send(SendError::InvalidMessage { .. }))));
        assert!(transport.get_requests().is_empty());
    }
}
