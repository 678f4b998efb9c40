//! Authorized Context
//!
//! The credential-bearing handle handed to callers once a token is available.
//! Attaches the bearer header to outbound requests and refreshes the access
//! token shortly before it expires.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::core::{HttpRequest, HttpResponse, HttpTransport, TokenEndpoint};
use crate::error::{OAuth2Error, TokenError};
use crate::types::{AccessToken, OAuth2Config, Token};

/// Where the context's token came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenSource {
    /// Loaded from the credential store.
    Cache,
    /// Obtained through a fresh acquisition.
    Acquired,
}

impl TokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Acquired => "acquired",
        }
    }
}

/// Authorized handle over a transport.
pub struct AuthorizedContext<T: HttpTransport> {
    config: OAuth2Config,
    transport: Arc<T>,
    endpoint: TokenEndpoint<T>,
    token: RwLock<Token>,
    source: TokenSource,
    refresh_buffer: chrono::Duration,
}

impl<T: HttpTransport> AuthorizedContext<T> {
    /// Wrap a token.
    pub fn new(
        config: OAuth2Config,
        transport: Arc<T>,
        token: Token,
        source: TokenSource,
        refresh_buffer: Duration,
    ) -> Self {
        Self {
            config,
            endpoint: TokenEndpoint::new(transport.clone()),
            transport,
            token: RwLock::new(token),
            source,
            refresh_buffer: chrono::Duration::from_std(refresh_buffer)
                .unwrap_or_else(|_| chrono::Duration::zero()),
        }
    }

    /// Where the token came from.
    pub fn source(&self) -> TokenSource {
        self.source
    }

    /// Credential the context was built for.
    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    /// Snapshot of the current token.
    pub async fn token(&self) -> Token {
        self.token.read().await.clone()
    }

    /// Current access token, refreshed first if it is about to expire.
    pub async fn access_token(&self) -> Result<AccessToken, OAuth2Error> {
        {
            let token = self.token.read().await;
            if !token.is_expiring_within(self.refresh_buffer) {
                return Ok(token.access_token());
            }
        }

        let mut token = self.token.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if !token.is_expiring_within(self.refresh_buffer) {
            return Ok(token.access_token());
        }

        let Some(refresh_token) = token.refresh_token.clone().filter(|t| !t.is_empty()) else {
            if token.is_expired() {
                warn!("Access token expired and no refresh token is available");
                return Err(TokenError::Expired.into());
            }
            return Ok(token.access_token());
        };

        debug!(expiry = ?token.expiry, "Refreshing access token");
        let response = self
            .endpoint
            .refresh(&self.config, &refresh_token)
            .await
            .map_err(|e| match e {
                OAuth2Error::Provider(provider) => TokenError::RefreshFailed {
                    message: provider.to_string(),
                }
                .into(),
                other => other,
            })?;

        let mut refreshed = Token::from_response(&response);
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token);
        }
        if refreshed.scope.is_none() {
            refreshed.scope = token.scope.take();
        }

        info!(expiry = ?refreshed.expiry, "Access token refreshed");
        *token = refreshed;
        Ok(token.access_token())
    }

    /// Attach the `authorization` header to `request`.
    pub async fn authorize(&self, mut request: HttpRequest) -> Result<HttpRequest, OAuth2Error> {
        let access_token = self.access_token().await?;
        request.headers.insert(
            "authorization".to_string(),
            access_token.authorization_header(),
        );
        Ok(request)
    }

    /// Authorize and send `request`.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, OAuth2Error> {
        let request = self.authorize(request).await?;
        self.transport.send(request).await
    }
}

impl<T: HttpTransport> std::fmt::Debug for AuthorizedContext<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedContext")
            .field("client_id", &self.config.credentials.client_id)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
