//! Core Components
//!
//! Transport, anti-forgery state, PKCE, the user prompt, and the token
//! endpoint client.

pub mod pkce;
pub mod prompt;
pub mod state;
pub mod token_endpoint;
pub mod transport;

pub use pkce::*;
pub use prompt::*;
pub use state::*;
pub use token_endpoint::*;
pub use transport::*;
