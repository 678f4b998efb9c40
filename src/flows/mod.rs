//! Token Acquisition
//!
//! Flows that obtain a brand-new token when the cache has nothing usable.

pub mod authorization_code;

pub use authorization_code::{AuthorizationCodeAcquirer, MockTokenAcquirer, TokenAcquirer};
