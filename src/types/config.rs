//! Configuration Types
//!
//! OAuth2 client configuration and the Google client secret file format.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::builders::OAuth2ConfigBuilder;
use crate::error::{ConfigurationError, OAuth2Error};

/// Google authorization endpoint.
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Gmail API scopes.
pub mod scopes {
    /// Send messages only.
    pub const GMAIL_SEND: &str = "https://www.googleapis.com/auth/gmail.send";

    /// Manage drafts and send messages.
    pub const GMAIL_COMPOSE: &str = "https://www.googleapis.com/auth/gmail.compose";

    /// Read, compose, and send messages; no permanent deletion.
    pub const GMAIL_MODIFY: &str = "https://www.googleapis.com/auth/gmail.modify";

    /// Scope set requested for sending mail.
    pub fn send_scopes() -> Vec<String> {
        vec![
            GMAIL_SEND.to_string(),
            GMAIL_COMPOSE.to_string(),
            GMAIL_MODIFY.to_string(),
        ]
    }
}

/// OAuth2 client configuration.
#[derive(Clone, Debug)]
pub struct OAuth2Config {
    /// Provider configuration.
    pub provider: ProviderConfig,
    /// Client credentials.
    pub credentials: ClientCredentials,
    /// Redirect URI registered for the client.
    pub redirect_uri: String,
    /// Scopes to request.
    pub scopes: Vec<String>,
    /// HTTP timeout.
    pub timeout: Duration,
    /// Send a PKCE challenge with the authorization request.
    pub enable_pkce: bool,
}

impl OAuth2Config {
    /// Build a configuration from the contents of a Google client secret file.
    ///
    /// Accepts both the `web` and `installed` (desktop) application shapes,
    /// preferring `web` when both are present. The first redirect URI is used.
    pub fn from_client_secret_json(
        bytes: &[u8],
        scopes: Vec<String>,
    ) -> Result<Self, OAuth2Error> {
        let file: ClientSecretFile = serde_json::from_slice(bytes).map_err(|e| {
            ConfigurationError::ParseFailed {
                message: e.to_string(),
            }
        })?;

        let secret = file.web.or(file.installed).ok_or_else(|| {
            ConfigurationError::ParseFailed {
                message: "expected an \"installed\" or \"web\" client".to_string(),
            }
        })?;

        let redirect_uri = secret.redirect_uris.first().cloned().ok_or_else(|| {
            ConfigurationError::MissingField {
                field: "redirect_uris".to_string(),
            }
        })?;

        let mut builder = OAuth2ConfigBuilder::new()
            .client_id(secret.client_id)
            .auth_method(ClientAuthMethod::ClientSecretPost)
            .authorization_endpoint(secret.auth_uri)
            .token_endpoint(secret.token_uri)
            .redirect_uri(redirect_uri)
            .scopes(scopes);

        if let Some(client_secret) = secret.client_secret.filter(|s| !s.is_empty()) {
            builder = builder.client_secret(client_secret);
        } else {
            builder = builder.auth_method(ClientAuthMethod::None);
        }

        builder.build()
    }

    /// Read and parse a Google client secret file.
    pub async fn from_client_secret_file(
        path: impl AsRef<Path>,
        scopes: Vec<String>,
    ) -> Result<Self, OAuth2Error> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ConfigurationError::ReadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        Self::from_client_secret_json(&bytes, scopes)
    }
}

/// OAuth2 provider endpoint configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Authorization endpoint URL.
    pub authorization_endpoint: String,
    /// Token endpoint URL.
    pub token_endpoint: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            authorization_endpoint: GOOGLE_AUTH_URI.to_string(),
            token_endpoint: GOOGLE_TOKEN_URI.to_string(),
        }
    }
}

/// Client credentials for OAuth2 authentication.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Client identifier.
    pub client_id: String,
    /// Client secret (for confidential clients).
    pub client_secret: Option<SecretString>,
    /// Client authentication method.
    pub auth_method: ClientAuthMethod,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_method", &self.auth_method)
            .finish()
    }
}

/// Client authentication method at the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
    /// client_id and client_secret in request body.
    #[default]
    ClientSecretPost,
    /// HTTP Basic Authentication header.
    ClientSecretBasic,
    /// No client authentication (public client).
    None,
}

/// Grant type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantType {
    #[serde(rename = "authorization_code")]
    AuthorizationCode,
    #[serde(rename = "refresh_token")]
    RefreshToken,
}

impl GrantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }
}

/// Google client secret file (`credentials.json`).
#[derive(Clone, Debug, Deserialize)]
pub struct ClientSecretFile {
    #[serde(default)]
    pub installed: Option<ClientSecret>,
    #[serde(default)]
    pub web: Option<ClientSecret>,
}

/// One client entry of a client secret file.
#[derive(Clone, Debug, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Default configuration values.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
