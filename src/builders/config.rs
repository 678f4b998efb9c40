//! Configuration Builder
//!
//! Fluent builder for OAuth2 configuration.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::{ConfigurationError, OAuth2Error};
use crate::types::{
    ClientAuthMethod, ClientCredentials, OAuth2Config, ProviderConfig, DEFAULT_TIMEOUT_SECS,
};

/// Loopback redirect used when none is configured.
const LOOPBACK_REDIRECT_URI: &str = "http://localhost";

/// OAuth2 configuration builder.
#[derive(Default)]
pub struct OAuth2ConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    auth_method: Option<ClientAuthMethod>,
    authorization_endpoint: Option<String>,
    token_endpoint: Option<String>,
    redirect_uri: Option<String>,
    scopes: Vec<String>,
    timeout: Duration,
    enable_pkce: bool,
}

impl OAuth2ConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            enable_pkce: true,
            ..Default::default()
        }
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set client authentication method.
    pub fn auth_method(mut self, method: ClientAuthMethod) -> Self {
        self.auth_method = Some(method);
        self
    }

    /// Set authorization endpoint.
    pub fn authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorization_endpoint = Some(endpoint.into());
        self
    }

    /// Set token endpoint.
    pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = Some(endpoint.into());
        self
    }

    /// Set redirect URI.
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Set requested scopes.
    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Add a requested scope.
    pub fn add_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable PKCE.
    pub fn enable_pkce(mut self, enable: bool) -> Self {
        self.enable_pkce = enable;
        self
    }

    /// Build the OAuth2 configuration.
    pub fn build(self) -> Result<OAuth2Config, OAuth2Error> {
        let client_id = self
            .client_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ConfigurationError::MissingField {
                field: "client_id".to_string(),
            })?;

        let authorization_endpoint = self.authorization_endpoint.ok_or_else(|| {
            ConfigurationError::MissingField {
                field: "authorization_endpoint".to_string(),
            }
        })?;
        validate_endpoint(&authorization_endpoint)?;

        let token_endpoint =
            self.token_endpoint
                .ok_or_else(|| ConfigurationError::MissingField {
                    field: "token_endpoint".to_string(),
                })?;
        validate_endpoint(&token_endpoint)?;

        let auth_method = self.auth_method.unwrap_or_default();

        if matches!(
            auth_method,
            ClientAuthMethod::ClientSecretBasic | ClientAuthMethod::ClientSecretPost
        ) && self.client_secret.is_none()
        {
            return Err(ConfigurationError::MissingField {
                field: "client_secret".to_string(),
            }
            .into());
        }

        Ok(OAuth2Config {
            credentials: ClientCredentials {
                client_id,
                client_secret: self.client_secret,
                auth_method,
            },
            provider: ProviderConfig {
                authorization_endpoint,
                token_endpoint,
            },
            redirect_uri: self
                .redirect_uri
                .unwrap_or_else(|| LOOPBACK_REDIRECT_URI.to_string()),
            scopes: self.scopes,
            timeout: self.timeout,
            enable_pkce: self.enable_pkce,
        })
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigurationError> {
    match Url::parse(endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigurationError::InvalidEndpoint {
            url: endpoint.to_string(),
        }),
    }
}

/// Create a new OAuth2 configuration builder.
pub fn oauth2_config() -> OAuth2ConfigBuilder {
    OAuth2ConfigBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_success() {
        let config = OAuth2ConfigBuilder::new()
            .client_id("test-client")
            .client_secret("test-secret")
            .authorization_endpoint("https://example.com/authorize")
            .token_endpoint("https://example.com/token")
            .add_scope("send")
            .add_scope("compose")
            .build()
            .unwrap();

        assert_eq!(config.credentials.client_id, "test-client");
        assert_eq!(
            config.provider.authorization_endpoint,
            "https://example.com/authorize"
        );
        assert_eq!(config.scopes, vec!["send", "compose"]);
        assert_eq!(config.redirect_uri, LOOPBACK_REDIRECT_URI);
        assert!(config.enable_pkce);
    }

    #[test]
    fn test_builder_missing_client_id() {
        let result = OAuth2ConfigBuilder::new()
            .client_secret("test-secret")
            .authorization_endpoint("https://example.com/authorize")
            .token_endpoint("https://example.com/token")
            .build();

        assert!(matches!(
            result,
            Err(OAuth2Error::Configuration(ConfigurationError::MissingField { ref field })) if field == "client_id"
        ));
    }

    #[test]
    fn test_builder_missing_secret_with_post_auth() {
        let result = OAuth2ConfigBuilder::new()
            .client_id("test-client")
            .authorization_endpoint("https://example.com/authorize")
            .token_endpoint("https://example.com/token")
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_builder_no_secret_required_for_none_auth() {
        let config = OAuth2ConfigBuilder::new()
            .client_id("test-client")
            .auth_method(ClientAuthMethod::None)
            .authorization_endpoint("https://example.com/authorize")
            .token_endpoint("https://example.com/token")
            .build()
            .unwrap();

        assert!(config.credentials.client_secret.is_none());
    }

    #[test]
    fn test_builder_rejects_invalid_endpoint() {
        let result = OAuth2ConfigBuilder::new()
            .client_id("test-client")
            .client_secret("test-secret")
            .authorization_endpoint("not a url")
            .token_endpoint("https://example.com/token")
            .build();

        assert!(matches!(
            result,
            Err(OAuth2Error::Configuration(ConfigurationError::InvalidEndpoint { .. }))
        ));
    }
}
