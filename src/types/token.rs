//! Token Types
//!
//! Token endpoint responses and the persisted token record.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Token response from authorization server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Expires in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Granted scopes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// ID token (OIDC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Persisted token record.
///
/// The JSON shape follows the common OAuth2 token file layout
/// (`access_token`, `token_type`, `refresh_token`, `expiry`) so files written
/// by other OAuth2 clients load unchanged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Access token.
    pub access_token: String,
    /// Token type.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiration time. `None` means the token does not expire.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_expiry"
    )]
    pub expiry: Option<DateTime<Utc>>,
    /// Space-separated granted scopes, when the provider reported them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Unix seconds of `0001-01-01T00:00:00Z`, the zero time other OAuth2
/// clients write for tokens without expiry.
const ZERO_TIME_SECS: i64 = -62_135_596_800;

fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let expiry = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(expiry.filter(|exp| {
        exp.timestamp() != ZERO_TIME_SECS || exp.timestamp_subsec_nanos() != 0
    }))
}

impl Token {
    /// Create from token response.
    pub fn from_response(response: &TokenResponse) -> Self {
        let expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs as i64));

        Self {
            access_token: response.access_token.clone(),
            token_type: response.token_type.clone(),
            refresh_token: response.refresh_token.clone(),
            expiry,
            scope: response.scope.clone(),
        }
    }

    /// Check if token is expired.
    pub fn is_expired(&self) -> bool {
        self.is_expiring_within(Duration::zero())
    }

    /// Check if token expires within `buffer` from now.
    pub fn is_expiring_within(&self, buffer: Duration) -> bool {
        self.expiry
            .map(|exp| exp <= Utc::now() + buffer)
            .unwrap_or(false)
    }

    /// Check if has refresh token.
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Granted scopes as a list.
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Check whether every requested scope was granted.
    ///
    /// Tokens that did not record their scopes are assumed to cover anything.
    pub fn covers_scopes(&self, requested: &[String]) -> bool {
        if self.scope.is_none() {
            return true;
        }
        let granted = self.scopes();
        requested.iter().all(|s| granted.contains(s))
    }

    /// Bearer credential for request headers.
    pub fn access_token(&self) -> AccessToken {
        AccessToken::from(self)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expiry", &self.expiry)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Access token wrapper for safe handling.
#[derive(Clone)]
pub struct AccessToken {
    /// Token value (secret).
    value: SecretString,
    /// Token type.
    pub token_type: String,
    /// Expiration time.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create new access token.
    pub fn new(value: String, token_type: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value: SecretString::new(value),
            token_type,
            expires_at,
        }
    }

    /// Get token value (for Authorization header).
    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// Format as Authorization header value.
    ///
    /// Providers return the type in varying case; the header always uses `Bearer`.
    pub fn authorization_header(&self) -> String {
        let token_type = if self.token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{} {}", token_type, self.value.expose_secret())
    }
}

impl From<&Token> for AccessToken {
    fn from(token: &Token) -> Self {
        Self::new(
            token.access_token.clone(),
            token.token_type.clone(),
            token.expiry,
        )
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
