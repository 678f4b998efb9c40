//! Gmail Integration Module
//!
//! Send mail through the Gmail API as a user who authorized this client with
//! the OAuth2 authorization code flow.
//!
//! # Features
//!
//! - Google client secret file loading (`installed` and `web` clients)
//! - Interactive Authorization Code Flow (RFC 6749 Section 4.1) with PKCE (RFC 7636)
//! - Token caching in a local JSON file, compatible with other OAuth2 clients
//! - Transparent Token Refresh (RFC 6749 Section 6) before expiry
//! - RFC 5322 message construction and `users.messages.send`
//!
//! # Example
//!
//! ```rust,ignore
//! use integrations_gmail::GmailClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GmailClient::from_client_secret_file("credentials.json", "token.json").await?;
//!
//!     // The first run prints an authorization URL and waits for the code.
//!     let receipt = client
//!         .send_mail("me@example.com", "you@example.com", "Hello", "Sent from Rust.")
//!         .await?;
//!
//!     println!("Status code: {}", receipt.status);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, token, and authorization data structures
//! - `error`: error hierarchy with provider error mapping
//! - `core`: HTTP transport, state, PKCE, the user prompt, and the token endpoint
//! - `flows`: token acquisition (interactive authorization code)
//! - `token`: credential store, token manager, and authorized context
//! - `mail`: message envelope and the Gmail send call
//! - `builders`: fluent configuration builder
//! - `client`: high-level client combining everything

pub mod builders;
pub mod client;
pub mod core;
pub mod error;
pub mod flows;
pub mod mail;
pub mod token;
pub mod types;

// Re-export main client
pub use client::{send_mail, GmailClient, DEFAULT_TOKEN_CACHE};

// Re-export builders
pub use builders::{oauth2_config, OAuth2ConfigBuilder};

// Re-export errors
pub use error::{
    create_error_from_response, map_token_error, parse_error_response, AuthorizationError,
    ConfigurationError, NetworkError, OAuth2Error, OAuth2ErrorResponse, OAuth2Result,
    ProtocolError, ProviderError, SendError, StorageError, TokenError,
};

// Re-export types
pub use types::{
    // Config
    scopes, ClientAuthMethod, ClientCredentials, ClientSecret, ClientSecretFile, GrantType,
    OAuth2Config, ProviderConfig,
    // Token
    AccessToken, Token, TokenResponse,
    // Auth
    AccessType, AuthorizationParams, AuthorizationUrl, CodeExchangeRequest, ConsentPrompt,
    PkceMethod, PkceParams,
    // Callback
    CallbackParams, StateMetadata,
};

// Re-export core components
pub use crate::core::{
    // Transport
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
    // State
    InMemoryStateManager, MockStateManager, StateManager,
    // PKCE
    DefaultPkceGenerator, PkceGenerator,
    // Prompt
    AuthorizationPrompt, ConsolePrompt, PromptRequest, ScriptedPrompt, StreamPrompt,
    // Token endpoint
    TokenEndpoint,
};

// Re-export flows
pub use flows::{AuthorizationCodeAcquirer, MockTokenAcquirer, TokenAcquirer};

// Re-export token management
pub use token::{
    // Storage
    CredentialStore, FileCredentialStore, InMemoryCredentialStore, MockCredentialStore,
    // Manager
    AuthorizationState, TokenManager, TokenManagerConfig,
    // Context
    AuthorizedContext, TokenSource,
};

// Re-export mail
pub use mail::{GmailTransport, MailMessage, SendReceipt, GMAIL_API_BASE};
