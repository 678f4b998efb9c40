//! Authorization Code Flow
//!
//! RFC 6749 Section 4.1 - Authorization Code Grant, driven interactively:
//! the user opens the authorization URL, consents, and types the code (or
//! the whole redirect URL) back into the prompt.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use url::Url;

use crate::core::{
    AuthorizationPrompt, DefaultPkceGenerator, HttpTransport, InMemoryStateManager,
    PkceGenerator, PromptRequest, StateManager, TokenEndpoint,
};
use crate::error::{AuthorizationError, ConfigurationError, OAuth2Error};
use crate::types::{
    AuthorizationParams, AuthorizationUrl, CallbackParams, CodeExchangeRequest, OAuth2Config,
    PkceMethod, StateMetadata, Token,
};

/// Obtains a brand-new token when no usable cached one exists.
#[async_trait]
pub trait TokenAcquirer: Send + Sync {
    /// Run the acquisition and return the resulting token.
    async fn acquire(&self, config: &OAuth2Config) -> Result<Token, OAuth2Error>;
}

/// Interactive authorization code acquirer.
pub struct AuthorizationCodeAcquirer<T: HttpTransport, U: AuthorizationPrompt> {
    endpoint: TokenEndpoint<T>,
    prompt: Arc<U>,
    state_manager: Arc<dyn StateManager>,
    pkce_generator: Arc<dyn PkceGenerator>,
}

impl<T: HttpTransport, U: AuthorizationPrompt + 'static> AuthorizationCodeAcquirer<T, U> {
    /// Create new acquirer.
    pub fn new(transport: Arc<T>, prompt: Arc<U>) -> Self {
        Self {
            endpoint: TokenEndpoint::new(transport),
            prompt,
            state_manager: Arc::new(InMemoryStateManager::new()),
            pkce_generator: Arc::new(DefaultPkceGenerator::new()),
        }
    }

    /// Replace the state manager.
    pub fn with_state_manager(mut self, state_manager: Arc<dyn StateManager>) -> Self {
        self.state_manager = state_manager;
        self
    }

    /// Replace the PKCE generator.
    pub fn with_pkce_generator(mut self, pkce_generator: Arc<dyn PkceGenerator>) -> Self {
        self.pkce_generator = pkce_generator;
        self
    }

    /// Build the URL the user must visit.
    pub fn build_authorization_url(
        &self,
        config: &OAuth2Config,
        params: &AuthorizationParams,
    ) -> Result<AuthorizationUrl, OAuth2Error> {
        let pkce = config
            .enable_pkce
            .then(|| self.pkce_generator.generate(PkceMethod::S256));

        let mut metadata = StateMetadata::new(params.redirect_uri.clone(), params.scopes.clone());
        if let Some(pkce) = &pkce {
            metadata = metadata.with_pkce_verifier(pkce.code_verifier.clone());
        }
        let state = self.state_manager.generate(metadata);

        let mut query: Vec<(String, String)> = vec![
            ("response_type".into(), "code".into()),
            ("client_id".into(), config.credentials.client_id.clone()),
            ("redirect_uri".into(), params.redirect_uri.clone()),
        ];
        if !params.scopes.is_empty() {
            query.push(("scope".into(), params.scopes.join(" ")));
        }
        query.push(("state".into(), state.clone()));
        query.push(("access_type".into(), params.access_type.as_str().into()));
        if let Some(prompt) = params.prompt {
            query.push(("prompt".into(), prompt.as_str().into()));
        }
        if let Some(login_hint) = &params.login_hint {
            query.push(("login_hint".into(), login_hint.clone()));
        }
        if let Some(pkce) = &pkce {
            query.push(("code_challenge".into(), pkce.code_challenge.clone()));
            query.push((
                "code_challenge_method".into(),
                pkce.code_challenge_method.as_str().into(),
            ));
        }
        for (key, value) in &params.extra_params {
            query.push((key.clone(), value.clone()));
        }

        let url = Url::parse_with_params(&config.provider.authorization_endpoint, &query)
            .map_err(|_| ConfigurationError::InvalidEndpoint {
                url: config.provider.authorization_endpoint.clone(),
            })?;

        Ok(AuthorizationUrl {
            url: url.into(),
            state,
            code_verifier: pkce.map(|p| p.code_verifier),
        })
    }

    async fn ask_user(&self, authorization_url: &str) -> Result<String, OAuth2Error> {
        let prompt = self.prompt.clone();
        let request = PromptRequest::new(authorization_url);

        tokio::task::spawn_blocking(move || prompt.prompt(&request))
            .await
            .map_err(|e| AuthorizationError::UserAbort {
                reason: format!("prompt task failed: {}", e),
            })?
    }

    /// Turn the user's answer into an authorization code, checking the
    /// returned state when the answer carried one.
    fn extract_code(&self, answer: &str, expected_state: &str) -> Result<String, OAuth2Error> {
        let callback = CallbackParams::from_input(answer);

        if let Some(error) = &callback.error {
            warn!(error = %error, "Authorization was refused");
            return Err(AuthorizationError::AccessDenied {
                error_description: callback.error_description.clone(),
                error_uri: callback.error_uri.clone(),
            }
            .into());
        }

        let code = callback
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthorizationError::UserAbort {
                reason: "no authorization code entered".to_string(),
            })?;

        match callback.state {
            Some(received) if received != expected_state => {
                self.state_manager.consume(expected_state);
                Err(AuthorizationError::StateMismatch {
                    expected: expected_state.to_string(),
                    received,
                }
                .into())
            }
            Some(received) => {
                crate::core::validate_state(&received, self.state_manager.as_ref())?;
                Ok(code)
            }
            None => {
                self.state_manager.consume(expected_state);
                Ok(code)
            }
        }
    }
}

#[async_trait]
impl<T: HttpTransport, U: AuthorizationPrompt + 'static> TokenAcquirer
    for AuthorizationCodeAcquirer<T, U>
{
    async fn acquire(&self, config: &OAuth2Config) -> Result<Token, OAuth2Error> {
        let params = AuthorizationParams::offline(config.redirect_uri.clone(), config.scopes.clone());
        let authorization = self.build_authorization_url(config, &params)?;

        info!(scopes = %params.scopes.join(" "), "Requesting user authorization");
        let answer = self.ask_user(&authorization.url).await?;
        let code = self.extract_code(&answer, &authorization.state)?;

        debug!("Exchanging authorization code");
        let response = self
            .endpoint
            .exchange_code(
                config,
                &CodeExchangeRequest {
                    code,
                    redirect_uri: params.redirect_uri,
                    code_verifier: authorization.code_verifier,
                },
            )
            .await?;

        let token = Token::from_response(&response);
        info!(
            expiry = ?token.expiry,
            has_refresh_token = token.has_refresh_token(),
            "Authorization code exchanged"
        );
        Ok(token)
    }
}

/// Mock acquirer for testing.
#[derive(Default)]
pub struct MockTokenAcquirer {
    responses: Mutex<VecDeque<Result<Token, OAuth2Error>>>,
    acquire_history: Mutex<Vec<Vec<String>>>,
}

impl MockTokenAcquirer {
    /// Create new mock acquirer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next acquired token.
    pub fn set_next_token(&self, token: Token) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(token));
        self
    }

    /// Queue the next failure.
    pub fn set_next_error(&self, error: OAuth2Error) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Number of acquisitions performed.
    pub fn get_call_count(&self) -> usize {
        self.acquire_history.lock().unwrap().len()
    }

    /// Scopes requested by each acquisition.
    pub fn get_acquire_history(&self) -> Vec<Vec<String>> {
        self.acquire_history.lock().unwrap().clone()
    }

    /// Token returned when nothing is queued.
    pub fn default_token() -> Token {
        Token {
            access_token: "mock-access-token".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("mock-refresh-token".to_string()),
            expiry: Some(chrono::Utc::now() + chrono::Duration::hours(1)),
            scope: None,
        }
    }
}

#[async_trait]
impl TokenAcquirer for MockTokenAcquirer {
    async fn acquire(&self, config: &OAuth2Config) -> Result<Token, OAuth2Error> {
        self.acquire_history
            .lock()
            .unwrap()
            .push(config.scopes.clone());

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Self::default_token()))
    }
}
