//! Callback Types
//!
//! Parsing of the authorization response the user types back, and the
//! metadata kept for each outstanding authorization request.

use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

/// Authorization response parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code (if success).
    pub code: Option<String>,
    /// State parameter.
    pub state: Option<String>,
    /// Error code (if authorization failed).
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
    /// Error URI.
    pub error_uri: Option<String>,
}

impl CallbackParams {
    /// Parse callback parameters from URL.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                "error_description" => params.error_description = Some(value.into_owned()),
                "error_uri" => params.error_uri = Some(value.into_owned()),
                _ => {}
            }
        }

        params
    }

    /// Parse what the user typed back: either the bare code or the full
    /// redirect URL copied from the browser address bar.
    pub fn from_input(input: &str) -> Self {
        let input = input.trim();

        if let Ok(url) = Url::parse(input) {
            if url.query().is_some() {
                return Self::from_url(&url);
            }
        }

        Self {
            code: (!input.is_empty()).then(|| input.to_string()),
            ..Self::default()
        }
    }

    /// Check if callback contains an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Check if callback is successful.
    pub fn is_success(&self) -> bool {
        self.code.is_some() && self.error.is_none()
    }
}

/// State metadata stored during authorization flow.
#[derive(Clone, Debug)]
pub struct StateMetadata {
    /// Redirect URI used in authorization request.
    pub redirect_uri: String,
    /// Scopes requested.
    pub scopes: Vec<String>,
    /// PKCE verifier.
    pub pkce_verifier: Option<String>,
    /// Creation timestamp (Unix milliseconds).
    pub created_at: u64,
}

impl StateMetadata {
    /// Create new state metadata.
    pub fn new(redirect_uri: String, scopes: Vec<String>) -> Self {
        Self {
            redirect_uri,
            scopes,
            pkce_verifier: None,
            created_at: now_ms(),
        }
    }

    /// Add PKCE verifier.
    pub fn with_pkce_verifier(mut self, verifier: String) -> Self {
        self.pkce_verifier = Some(verifier);
        self
    }

    /// Check if state has expired.
    pub fn is_expired(&self, max_age_ms: u64) -> bool {
        now_ms().saturating_sub(self.created_at) > max_age_ms
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
