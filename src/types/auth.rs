//! Authorization Types
//!
//! Types for the authorization code flow.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for authorization URL generation.
#[derive(Clone, Debug)]
pub struct AuthorizationParams {
    /// Redirect URI.
    pub redirect_uri: String,
    /// Requested scopes.
    pub scopes: Vec<String>,
    /// Whether a refresh token is requested.
    pub access_type: AccessType,
    /// Consent screen behavior.
    pub prompt: Option<ConsentPrompt>,
    /// Login hint for pre-filling user identity.
    pub login_hint: Option<String>,
    /// Additional parameters.
    pub extra_params: HashMap<String, String>,
}

impl AuthorizationParams {
    /// Offline access with a forced consent screen, so a refresh token is always issued.
    pub fn offline(redirect_uri: impl Into<String>, scopes: Vec<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            scopes,
            access_type: AccessType::Offline,
            prompt: Some(ConsentPrompt::Consent),
            login_hint: None,
            extra_params: HashMap::new(),
        }
    }
}

/// Result of authorization URL generation.
#[derive(Clone, Debug)]
pub struct AuthorizationUrl {
    /// The authorization URL to present to the user.
    pub url: String,
    /// State parameter for CSRF validation.
    pub state: String,
    /// PKCE code verifier, when a challenge was sent.
    pub code_verifier: Option<String>,
}

/// Code exchange request.
#[derive(Clone, Debug)]
pub struct CodeExchangeRequest {
    /// Authorization code.
    pub code: String,
    /// Redirect URI (must match authorization request).
    pub redirect_uri: String,
    /// PKCE code verifier.
    pub code_verifier: Option<String>,
}

/// `access_type` authorization parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Access token only.
    Online,
    /// Access token plus refresh token.
    #[default]
    Offline,
}

impl AccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

/// `prompt` authorization parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentPrompt {
    /// Do not display any authentication or consent UI.
    None,
    /// Force consent screen.
    Consent,
    /// Force account selection.
    SelectAccount,
}

impl ConsentPrompt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Consent => "consent",
            Self::SelectAccount => "select_account",
        }
    }
}

/// PKCE challenge method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PkceMethod {
    /// SHA-256 hash (recommended).
    #[default]
    S256,
    /// Plain text (not recommended).
    Plain,
}

impl PkceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

/// PKCE parameters.
#[derive(Clone)]
pub struct PkceParams {
    /// Code verifier (keep secret).
    pub code_verifier: String,
    /// Code challenge (sent in authorization URL).
    pub code_challenge: String,
    /// Challenge method used.
    pub code_challenge_method: PkceMethod,
}

impl std::fmt::Debug for PkceParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceParams")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .field("code_challenge_method", &self.code_challenge_method)
            .finish()
    }
}
