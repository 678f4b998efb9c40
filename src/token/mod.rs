//! Token Management
//!
//! Token persistence, the manager that decides between cache and
//! acquisition, and the authorized context handed to callers.

pub mod context;
pub mod manager;
pub mod storage;

pub use context::{AuthorizedContext, TokenSource};
pub use manager::{AuthorizationState, TokenManager, TokenManagerConfig};
pub use storage::{
    CredentialStore, FileCredentialStore, InMemoryCredentialStore, MockCredentialStore,
};
