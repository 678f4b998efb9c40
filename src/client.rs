//! Gmail Client
//!
//! High-level client that combines the client credential, the token cache,
//! interactive authorization, and the send call.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::core::{AuthorizationPrompt, ConsolePrompt, HttpTransport, ReqwestHttpTransport};
use crate::error::OAuth2Error;
use crate::flows::AuthorizationCodeAcquirer;
use crate::mail::{GmailTransport, MailMessage, SendReceipt};
use crate::token::{
    AuthorizedContext, CredentialStore, FileCredentialStore, TokenManager, TokenManagerConfig,
};
use crate::types::{scopes, OAuth2Config};

/// Default token cache file.
pub const DEFAULT_TOKEN_CACHE: &str = "token.json";

/// Client for sending mail as an authorized Gmail user.
pub struct GmailClient<
    T: HttpTransport = ReqwestHttpTransport,
    S: CredentialStore = FileCredentialStore,
    U: AuthorizationPrompt + 'static = ConsolePrompt,
> {
    config: OAuth2Config,
    cache_path: PathBuf,
    manager: TokenManager<T, S, AuthorizationCodeAcquirer<T, U>>,
    mail: GmailTransport,
}

impl GmailClient<ReqwestHttpTransport, FileCredentialStore, ConsolePrompt> {
    /// Create a client with the reqwest transport, a file token cache, and
    /// the console prompt.
    pub fn new(config: OAuth2Config, cache_path: impl Into<PathBuf>) -> Result<Self, OAuth2Error> {
        let transport = Arc::new(ReqwestHttpTransport::with_options(
            config.timeout,
            crate::core::DEFAULT_MAX_RESPONSE_SIZE,
        )?);

        Ok(Self::with_components(
            config,
            cache_path,
            transport,
            Arc::new(FileCredentialStore::new()),
            Arc::new(ConsolePrompt::new()),
        ))
    }

    /// Create a client from a Google client secret file, requesting the
    /// Gmail send, compose, and modify scopes.
    pub async fn from_client_secret_file(
        credentials_path: impl AsRef<Path>,
        cache_path: impl Into<PathBuf>,
    ) -> Result<Self, OAuth2Error> {
        let config =
            OAuth2Config::from_client_secret_file(credentials_path, scopes::send_scopes()).await?;
        Self::new(config, cache_path)
    }
}

impl<T: HttpTransport, S: CredentialStore, U: AuthorizationPrompt + 'static> GmailClient<T, S, U> {
    /// Create a client with custom implementations.
    pub fn with_components(
        config: OAuth2Config,
        cache_path: impl Into<PathBuf>,
        transport: Arc<T>,
        store: Arc<S>,
        prompt: Arc<U>,
    ) -> Self {
        let acquirer = Arc::new(AuthorizationCodeAcquirer::new(transport.clone(), prompt));

        Self {
            config,
            cache_path: cache_path.into(),
            manager: TokenManager::new(transport, store, acquirer),
            mail: GmailTransport::default(),
        }
    }

    /// Send through a different Gmail API base URL.
    pub fn with_api_base(mut self, base_url: impl Into<String>) -> Self {
        self.mail = GmailTransport::new(base_url);
        self
    }

    /// Replace the token manager configuration.
    pub fn with_manager_config(mut self, config: TokenManagerConfig) -> Self {
        self.manager = self.manager.with_config(config);
        self
    }

    /// Get the OAuth2 configuration.
    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    /// Path of the token cache.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Obtain an authorized context, prompting the user if nothing is cached.
    pub async fn authorize(&self) -> Result<AuthorizedContext<T>, OAuth2Error> {
        self.manager
            .get_authorized_context(&self.config, &self.cache_path)
            .await
    }

    /// Forget the cached token, e.g. after changing scopes.
    pub async fn reset_token(&self) -> Result<bool, OAuth2Error> {
        self.manager.reset(&self.cache_path).await
    }

    /// Send `message` as the authorized user.
    pub async fn send_message(&self, message: &MailMessage) -> Result<SendReceipt, OAuth2Error> {
        let context = self.authorize().await?;
        info!(source = context.source().as_str(), to = %message.to, "Sending message");
        self.mail.send(&context, message).await
    }

    /// Send a plain-text message.
    pub async fn send_mail(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<SendReceipt, OAuth2Error> {
        self.send_message(&MailMessage::new(from, to, subject, body))
            .await
    }
}

/// Send one message using the client secret at `credentials_path` and the
/// token cached at `cache_path`, prompting on the console when no token is
/// cached.
pub async fn send_mail(
    from: &str,
    to: &str,
    subject: &str,
    body: &str,
    credentials_path: impl AsRef<Path>,
    cache_path: impl AsRef<Path>,
) -> Result<SendReceipt, OAuth2Error> {
    GmailClient::from_client_secret_file(credentials_path, cache_path.as_ref())
        .await?
        .send_mail(from, to, subject, body)
        .await
}
