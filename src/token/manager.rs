//! Token Manager
//!
//! Produces an authorized context: from the credential store when a token is
//! cached, otherwise through a fresh acquisition whose result is persisted.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::HttpTransport;
use crate::error::{OAuth2Error, StorageError};
use crate::flows::TokenAcquirer;
use crate::token::{AuthorizedContext, CredentialStore, TokenSource};
use crate::types::{OAuth2Config, Token};

/// Token manager configuration.
#[derive(Debug, Clone)]
pub struct TokenManagerConfig {
    /// Lead time before expiry at which the context refreshes (default: 10 seconds).
    pub refresh_buffer: Duration,
    /// Treat a cached token that lacks a requested scope as a cache miss.
    pub verify_scopes: bool,
}

impl Default for TokenManagerConfig {
    fn default() -> Self {
        Self {
            refresh_buffer: Duration::from_secs(10),
            verify_scopes: false,
        }
    }
}

/// Progress of one `get_authorized_context` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthorizationState {
    Start,
    Loading,
    Acquiring,
    Authorized,
    Failed,
}

impl AuthorizationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Loading => "loading",
            Self::Acquiring => "acquiring",
            Self::Authorized => "authorized",
            Self::Failed => "failed",
        }
    }
}

fn enter(state: AuthorizationState) {
    debug!(state = state.as_str(), "Authorization state");
}

/// Token lifecycle manager.
pub struct TokenManager<T: HttpTransport, S: CredentialStore, A: TokenAcquirer> {
    config: TokenManagerConfig,
    transport: Arc<T>,
    store: Arc<S>,
    acquirer: Arc<A>,
}

impl<T: HttpTransport, S: CredentialStore, A: TokenAcquirer> TokenManager<T, S, A> {
    /// Create new token manager.
    pub fn new(transport: Arc<T>, store: Arc<S>, acquirer: Arc<A>) -> Self {
        Self {
            config: TokenManagerConfig::default(),
            transport,
            store,
            acquirer,
        }
    }

    /// Replace the manager configuration.
    pub fn with_config(mut self, config: TokenManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get a context authorized for `config`, using the token cached at
    /// `cache_path` when there is one.
    ///
    /// A cached token is used without a freshness check; the context refreshes
    /// it on first use. A token obtained by acquisition is saved on a
    /// best-effort basis: a failed save is logged and does not fail the call.
    pub async fn get_authorized_context(
        &self,
        config: &OAuth2Config,
        cache_path: &Path,
    ) -> Result<AuthorizedContext<T>, OAuth2Error> {
        enter(AuthorizationState::Start);

        enter(AuthorizationState::Loading);
        match self.load_cached(config, cache_path).await {
            Some(token) => {
                info!(path = %cache_path.display(), "Using cached token");
                enter(AuthorizationState::Authorized);
                return Ok(self.context(config, token, TokenSource::Cache));
            }
            None => info!(path = %cache_path.display(), "No usable cached token"),
        }

        enter(AuthorizationState::Acquiring);
        let token = match self.acquirer.acquire(config).await {
            Ok(token) => token,
            Err(e) => {
                enter(AuthorizationState::Failed);
                warn!(error = %e, code = e.error_code(), "Token acquisition failed");
                return Err(e);
            }
        };

        match self.store.save(cache_path, &token).await {
            Ok(()) => info!(path = %cache_path.display(), "Saved token"),
            Err(e) => warn!(error = %e, "Unable to cache token"),
        }

        enter(AuthorizationState::Authorized);
        Ok(self.context(config, token, TokenSource::Acquired))
    }

    /// Remove the cached token so the next call acquires a new one.
    pub async fn reset(&self, cache_path: &Path) -> Result<bool, OAuth2Error> {
        let removed = self.store.delete(cache_path).await?;
        if removed {
            info!(path = %cache_path.display(), "Removed cached token");
        }
        Ok(removed)
    }

    async fn load_cached(&self, config: &OAuth2Config, cache_path: &Path) -> Option<Token> {
        let token = match self.store.load(cache_path).await {
            Ok(token) => token,
            Err(e @ StorageError::NotFound { .. }) => {
                debug!(error = %e, "Token cache miss");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable token cache");
                return None;
            }
        };

        if self.config.verify_scopes && !token.covers_scopes(&config.scopes) {
            info!(
                granted = token.scope.as_deref().unwrap_or(""),
                "Cached token does not cover the requested scopes"
            );
            return None;
        }

        Some(token)
    }

    fn context(&self, config: &OAuth2Config, token: Token, source: TokenSource) -> AuthorizedContext<T> {
        AuthorizedContext::new(
            config.clone(),
            self.transport.clone(),
            token,
            source,
            self.config.refresh_buffer,
        )
    }
}
