//! State Management
//!
//! Anti-forgery `state` parameter generation and validation.

use rand::Rng;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::{AuthorizationError, OAuth2Error};
use crate::types::StateMetadata;

/// State manager interface (for dependency injection).
pub trait StateManager: Send + Sync {
    /// Generate a new state parameter with metadata.
    fn generate(&self, metadata: StateMetadata) -> String;

    /// Validate and consume a state parameter.
    fn consume(&self, state: &str) -> Option<StateMetadata>;

    /// Check if state exists.
    fn exists(&self, state: &str) -> bool;
}

/// In-memory state manager implementation.
pub struct InMemoryStateManager {
    states: Mutex<HashMap<String, StateMetadata>>,
    max_age_ms: u64,
}

impl InMemoryStateManager {
    /// Create new state manager with default TTL (10 minutes).
    pub fn new() -> Self {
        Self::with_max_age(Duration::from_secs(600))
    }

    /// Create state manager with custom TTL.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
            max_age_ms: max_age.as_millis() as u64,
        }
    }

    fn states(&self) -> MutexGuard<'_, HashMap<String, StateMetadata>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn generate_random_state() -> String {
        let bytes: [u8; 32] = rand::thread_rng().gen();
        base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
    }
}

impl Default for InMemoryStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl StateManager for InMemoryStateManager {
    fn generate(&self, metadata: StateMetadata) -> String {
        let state = Self::generate_random_state();
        let mut states = self.states();
        states.retain(|_, m| !m.is_expired(self.max_age_ms));
        states.insert(state.clone(), metadata);
        state
    }

    fn consume(&self, state: &str) -> Option<StateMetadata> {
        let metadata = self.states().remove(state)?;

        if metadata.is_expired(self.max_age_ms) {
            return None;
        }

        Some(metadata)
    }

    fn exists(&self, state: &str) -> bool {
        self.states()
            .get(state)
            .is_some_and(|metadata| !metadata.is_expired(self.max_age_ms))
    }
}

/// Mock state manager for testing.
#[derive(Default)]
pub struct MockStateManager {
    states: Mutex<HashMap<String, StateMetadata>>,
    generate_history: Mutex<Vec<StateMetadata>>,
    consume_history: Mutex<Vec<String>>,
    next_state: Mutex<Option<String>>,
}

impl MockStateManager {
    /// Create new mock state manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the next state to generate.
    pub fn set_next_state(&self, state: impl Into<String>) -> &Self {
        *self.next_state.lock().unwrap() = Some(state.into());
        self
    }

    /// Get generate history.
    pub fn get_generate_history(&self) -> Vec<StateMetadata> {
        self.generate_history.lock().unwrap().clone()
    }

    /// Get consume history.
    pub fn get_consume_history(&self) -> Vec<String> {
        self.consume_history.lock().unwrap().clone()
    }
}

impl StateManager for MockStateManager {
    fn generate(&self, metadata: StateMetadata) -> String {
        self.generate_history.lock().unwrap().push(metadata.clone());

        let state = self
            .next_state
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| format!("mock-state-{}", rand::random::<u32>()));

        self.states.lock().unwrap().insert(state.clone(), metadata);
        state
    }

    fn consume(&self, state: &str) -> Option<StateMetadata> {
        self.consume_history
            .lock()
            .unwrap()
            .push(state.to_string());
        self.states.lock().unwrap().remove(state)
    }

    fn exists(&self, state: &str) -> bool {
        self.states.lock().unwrap().contains_key(state)
    }
}

/// Validate and consume a returned state parameter.
pub fn validate_state(
    received: &str,
    state_manager: &dyn StateManager,
) -> Result<StateMetadata, OAuth2Error> {
    state_manager.consume(received).ok_or_else(|| {
        AuthorizationError::StateMismatch {
            expected: "valid state".to_string(),
            received: received.to_string(),
        }
        .into()
    })
}
