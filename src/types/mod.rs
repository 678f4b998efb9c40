//! Types
//!
//! Configuration, token, and authorization type definitions.

pub mod auth;
pub mod callback;
pub mod config;
pub mod token;

pub use auth::*;
pub use callback::*;
pub use config::*;
pub use token::*;
