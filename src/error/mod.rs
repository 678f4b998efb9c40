//! Error Types
//!
//! Error hierarchy for credential loading, token caching, acquisition,
//! refresh, and message delivery.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Root error type.
#[derive(Error, Debug)]
pub enum OAuth2Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),
}

impl OAuth2Error {
    /// Stable error code for log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "OAUTH2_CONFIG",
            Self::Authorization(_) => "OAUTH2_AUTH",
            Self::Token(_) => "OAUTH2_TOKEN",
            Self::Network(_) => "OAUTH2_NETWORK",
            Self::Storage(_) => "OAUTH2_STORAGE",
            Self::Protocol(_) => "OAUTH2_PROTOCOL",
            Self::Provider(_) => "OAUTH2_PROVIDER",
            Self::Send(_) => "MAIL_SEND",
        }
    }

    /// Check if the error means no usable cached token was found.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_cache_miss())
    }

    /// Check if error requires running the interactive authorization again.
    pub fn needs_reauth(&self) -> bool {
        match self {
            Self::Token(TokenError::Expired) => true,
            Self::Token(TokenError::RefreshFailed { .. }) => true,
            Self::Provider(ProviderError::InvalidGrant { .. }) => true,
            Self::Authorization(AuthorizationError::AccessDenied { .. }) => true,
            Self::Send(SendError::Rejected { status: 401, .. }) => true,
            _ => false,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Unable to read client secret file {path:?}: {message}")]
    ReadFailed { path: PathBuf, message: String },

    #[error("Unable to parse client secret file: {message}")]
    ParseFailed { message: String },
}

/// Authorization flow error.
#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Authorization aborted: {reason}")]
    UserAbort { reason: String },

    #[error("Access denied by user")]
    AccessDenied {
        error_description: Option<String>,
        error_uri: Option<String>,
    },

    #[error("State parameter mismatch (possible CSRF attack)")]
    StateMismatch { expected: String, received: String },
}

/// Token-related error.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token expired and no refresh token is available")]
    Expired,

    #[error("Token refresh failed: {message}")]
    RefreshFailed { message: String },
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("TLS error: {message}")]
    TlsError { message: String },
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// Token cache storage error.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("No cached token at {path:?}")]
    NotFound { path: PathBuf },

    #[error("Read failed for {path:?}: {message}")]
    ReadFailed { path: PathBuf, message: String },

    #[error("Corrupted token record at {path:?}: {message}")]
    CorruptedData { path: PathBuf, message: String },

    #[error("Write failed for {path:?}: {message}")]
    WriteFailed { path: PathBuf, message: String },

    #[error("Delete failed for {path:?}: {message}")]
    DeleteFailed { path: PathBuf, message: String },
}

impl StorageError {
    /// Load failures that should send the caller back to acquisition.
    pub fn is_cache_miss(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::ReadFailed { .. } | Self::CorruptedData { .. }
        )
    }
}

/// Provider (OAuth2 server) error.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid client credentials")]
    InvalidClient { error_description: Option<String> },

    #[error("Invalid grant: {message}")]
    InvalidGrant { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid scope: {scope}")]
    InvalidScope { scope: String },

    #[error("Unauthorized client for this grant type")]
    UnauthorizedClient { error_description: Option<String> },

    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType { grant_type: String },

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("Server temporarily unavailable")]
    TemporarilyUnavailable { retry_after: Option<Duration> },
}

/// Mail delivery error.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Send rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid message: {message}")]
    InvalidMessage { message: String },
}

/// Result type for OAuth2 operations.
pub type OAuth2Result<T> = Result<T, OAuth2Error>;

/// OAuth2 error response from provider.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct OAuth2ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Map token error response to error type.
pub fn map_token_error(response: &OAuth2ErrorResponse) -> ProviderError {
    let description = || {
        response
            .error_description
            .clone()
            .unwrap_or_else(|| response.error.clone())
    };

    match response.error.as_str() {
        "invalid_client" => ProviderError::InvalidClient {
            error_description: response.error_description.clone(),
        },
        "invalid_grant" => ProviderError::InvalidGrant {
            message: description(),
        },
        "invalid_scope" => ProviderError::InvalidScope {
            scope: response.error_description.clone().unwrap_or_default(),
        },
        "unauthorized_client" => ProviderError::UnauthorizedClient {
            error_description: response.error_description.clone(),
        },
        "unsupported_grant_type" => ProviderError::UnsupportedGrantType {
            grant_type: response.error_description.clone().unwrap_or_default(),
        },
        "server_error" => ProviderError::ServerError {
            message: description(),
        },
        "temporarily_unavailable" => ProviderError::TemporarilyUnavailable { retry_after: None },
        _ => ProviderError::InvalidRequest {
            message: description(),
        },
    }
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &str) -> Option<OAuth2ErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Create error from a failed token endpoint response.
pub fn create_error_from_response(status: u16, body: &str) -> OAuth2Error {
    if let Some(response) = parse_error_response(body) {
        return OAuth2Error::Provider(map_token_error(&response));
    }

    let error = match status {
        400 => ProviderError::InvalidRequest {
            message: "Bad request".to_string(),
        },
        401 => ProviderError::InvalidClient {
            error_description: Some("Unauthorized".to_string()),
        },
        403 => ProviderError::UnauthorizedClient {
            error_description: Some("Forbidden".to_string()),
        },
        429 => ProviderError::TemporarilyUnavailable {
            retry_after: Some(Duration::from_secs(60)),
        },
        _ => ProviderError::ServerError {
            message: format!("HTTP {}", status),
        },
    };

    OAuth2Error::Provider(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_miss_classification() {
        let path = PathBuf::from("token.json");
        assert!(OAuth2Error::Storage(StorageError::NotFound { path: path.clone() }).is_cache_miss());
        assert!(OAuth2Error::Storage(StorageError::CorruptedData {
            path: path.clone(),
            message: "EOF".to_string()
        })
        .is_cache_miss());
        assert!(!OAuth2Error::Storage(StorageError::WriteFailed {
            path,
            message: "read-only".to_string()
        })
        .is_cache_miss());
        assert!(!OAuth2Error::Token(TokenError::Expired).is_cache_miss());
    }

    #[test]
    fn test_needs_reauth() {
        assert!(OAuth2Error::Token(TokenError::Expired).needs_reauth());
        assert!(OAuth2Error::Provider(ProviderError::InvalidGrant {
            message: "Token has been expired or revoked.".to_string()
        })
        .needs_reauth());
        assert!(!OAuth2Error::Network(NetworkError::ConnectionFailed {
            message: "refused".to_string()
        })
        .needs_reauth());
    }

    #[test]
    fn test_parse_error_response() {
        let body = r#"{"error":"invalid_grant","error_description":"Malformed auth code."}"#;
        let response = parse_error_response(body).unwrap();
        assert_eq!(response.error, "invalid_grant");
        assert_eq!(
            response.error_description,
            Some("Malformed auth code.".to_string())
        );
    }

    #[test]
    fn test_create_error_from_response() {
        let error = create_error_from_response(400, r#"{"error":"invalid_grant"}"#);
        assert!(matches!(
            error,
            OAuth2Error::Provider(ProviderError::InvalidGrant { ref message }) if message == "invalid_grant"
        ));

        let error = create_error_from_response(502, "<html>Bad Gateway</html>");
        assert!(matches!(
            error,
            OAuth2Error::Provider(ProviderError::ServerError { .. })
        ));

        let error = create_error_from_response(429, "");
        assert!(matches!(
            error,
            OAuth2Error::Provider(ProviderError::TemporarilyUnavailable { retry_after: Some(_) })
        ));
    }
}
