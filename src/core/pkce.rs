//! PKCE Generator
//!
//! RFC 7636 Proof Key for Code Exchange, sent alongside the authorization
//! request so an intercepted code cannot be redeemed elsewhere.

use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::types::{PkceMethod, PkceParams};

const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// PKCE generator interface (for dependency injection).
pub trait PkceGenerator: Send + Sync {
    /// Generate PKCE parameters.
    fn generate(&self, method: PkceMethod) -> PkceParams;
}

/// Default PKCE generator implementation.
pub struct DefaultPkceGenerator {
    verifier_length: usize,
}

impl DefaultPkceGenerator {
    /// Create new PKCE generator with default verifier length (64).
    pub fn new() -> Self {
        Self::with_length(64)
    }

    /// Create PKCE generator with custom verifier length, clamped to 43..=128.
    pub fn with_length(length: usize) -> Self {
        Self {
            verifier_length: length.clamp(43, 128),
        }
    }

    fn generate_verifier(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.verifier_length)
            .map(|_| VERIFIER_CHARSET[rng.gen_range(0..VERIFIER_CHARSET.len())] as char)
            .collect()
    }
}

impl Default for DefaultPkceGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PkceGenerator for DefaultPkceGenerator {
    fn generate(&self, method: PkceMethod) -> PkceParams {
        let code_verifier = self.generate_verifier();
        let code_challenge = compute_challenge(&code_verifier, method);

        PkceParams {
            code_verifier,
            code_challenge,
            code_challenge_method: method,
        }
    }
}

/// Compute challenge from verifier.
pub fn compute_challenge(verifier: &str, method: PkceMethod) -> String {
    match method {
        PkceMethod::Plain => verifier.to_string(),
        PkceMethod::S256 => {
            let hash = Sha256::digest(verifier.as_bytes());
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hash)
        }
    }
}

/// Validate PKCE verifier format.
pub fn is_valid_verifier(verifier: &str) -> bool {
    (43..=128).contains(&verifier.len())
        && verifier.bytes().all(|b| VERIFIER_CHARSET.contains(&b))
}
