//! Token Endpoint
//!
//! Form-encoded requests to the provider's token endpoint, shared by the
//! code exchange and the refresh grant.

use base64::Engine;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded;

use crate::core::{HttpRequest, HttpTransport};
use crate::error::{create_error_from_response, OAuth2Error, ProtocolError};
use crate::types::{ClientAuthMethod, CodeExchangeRequest, GrantType, OAuth2Config, TokenResponse};

/// Client for the token endpoint.
pub struct TokenEndpoint<T: HttpTransport> {
    transport: Arc<T>,
}

impl<T: HttpTransport> Clone for TokenEndpoint<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
        }
    }
}

impl<T: HttpTransport> TokenEndpoint<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        config: &OAuth2Config,
        request: &CodeExchangeRequest,
    ) -> Result<TokenResponse, OAuth2Error> {
        let mut params = vec![
            ("grant_type", GrantType::AuthorizationCode.as_str().to_string()),
            ("code", request.code.clone()),
            ("redirect_uri", request.redirect_uri.clone()),
        ];
        if let Some(verifier) = &request.code_verifier {
            params.push(("code_verifier", verifier.clone()));
        }

        self.post(config, params).await
    }

    /// Obtain a new access token with a refresh token.
    pub async fn refresh(
        &self,
        config: &OAuth2Config,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuth2Error> {
        let params = vec![
            ("grant_type", GrantType::RefreshToken.as_str().to_string()),
            ("refresh_token", refresh_token.to_string()),
        ];

        self.post(config, params).await
    }

    async fn post(
        &self,
        config: &OAuth2Config,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<TokenResponse, OAuth2Error> {
        let credentials = &config.credentials;

        match credentials.auth_method {
            ClientAuthMethod::ClientSecretPost => {
                params.push(("client_id", credentials.client_id.clone()));
                if let Some(secret) = &credentials.client_secret {
                    params.push(("client_secret", secret.expose_secret().to_string()));
                }
            }
            ClientAuthMethod::None => {
                params.push(("client_id", credentials.client_id.clone()));
            }
            ClientAuthMethod::ClientSecretBasic => {}
        }

        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();

        let mut request = HttpRequest::form_post(&config.provider.token_endpoint, body)
            .with_timeout(config.timeout);

        if credentials.auth_method == ClientAuthMethod::ClientSecretBasic {
            if let Some(secret) = &credentials.client_secret {
                let basic = format!(
                    "{}:{}",
                    encode_component(&credentials.client_id),
                    encode_component(secret.expose_secret())
                );
                let encoded = base64::engine::general_purpose::STANDARD.encode(basic);
                request
                    .headers
                    .insert("authorization".to_string(), format!("Basic {}", encoded));
            }
        }

        debug!(endpoint = %config.provider.token_endpoint, "Calling token endpoint");
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(create_error_from_response(response.status, &response.body));
        }

        let token: TokenResponse =
            serde_json::from_str(&response.body).map_err(|e| ProtocolError::InvalidJson {
                message: e.to_string(),
            })?;

        if token.access_token.is_empty() {
            return Err(ProtocolError::InvalidResponse {
                message: "token response is missing access_token".to_string(),
            }
            .into());
        }

        Ok(token)
    }
}

/// RFC 6749 section 2.3.1 form-encodes Basic credentials.
fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
