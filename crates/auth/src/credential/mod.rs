//! Credential strategy registry.
//!
//! An organization names one credential scheme; the registry maps that
//! identifier to the strategy that compares a candidate secret against a
//! stored hash. The registry is assembled once at startup through
//! [`CredentialRegistry::builder`] and is immutable afterwards, so it can be
//! shared behind an `Arc` by any number of concurrent sign-in attempts.

mod argon;
mod digest;

use std::collections::HashMap;
use std::sync::Arc;

pub use argon::Argon2idVerifier;
pub use digest::{PlainVerifier, SaltedDigestVerifier, Sha256SaltVerifier, Sha512SaltVerifier};

/// Scheme identifiers registered by [`CredentialRegistryBuilder::with_defaults`].
pub mod scheme {
    pub const PLAIN: &str = "plain";
    pub const SALT: &str = "salt";
    pub const SHA256_SALT: &str = "sha256-salt";
    pub const SHA512_SALT: &str = "sha512-salt";
    pub const ARGON2ID: &str = "argon2id";
}

/// Compares a candidate secret against a stored hash.
pub trait CredentialVerifier: Send + Sync {
    /// `account_salt` is empty when verifying an organization master secret.
    fn verify(
        &self,
        candidate: &str,
        stored_hash: &str,
        account_salt: &str,
        organization_salt: &str,
    ) -> bool;
}

/// Read-only map of scheme identifier to strategy.
pub struct CredentialRegistry {
    schemes: HashMap<String, Arc<dyn CredentialVerifier>>,
}

impl CredentialRegistry {
    pub fn builder() -> CredentialRegistryBuilder {
        CredentialRegistryBuilder::default()
    }

    /// Registry holding every built-in scheme.
    pub fn with_defaults() -> Self {
        Self::builder().with_defaults().build()
    }

    /// Strategy for `scheme`; `None` means the scheme is not supported and must
    /// be reported as a configuration error, not as a wrong secret.
    pub fn get(&self, scheme: &str) -> Option<&dyn CredentialVerifier> {
        self.schemes.get(scheme).map(|v| v.as_ref())
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.schemes.contains_key(scheme)
    }

    /// Registered identifiers, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl core::fmt::Debug for CredentialRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

#[derive(Default)]
pub struct CredentialRegistryBuilder {
    schemes: HashMap<String, Arc<dyn CredentialVerifier>>,
}

impl CredentialRegistryBuilder {
    pub fn with_defaults(self) -> Self {
        self.register(scheme::PLAIN, PlainVerifier)
            .register(scheme::SALT, Sha256SaltVerifier::new())
            .register(scheme::SHA256_SALT, Sha256SaltVerifier::new())
            .register(scheme::SHA512_SALT, Sha512SaltVerifier::new())
            .register(scheme::ARGON2ID, Argon2idVerifier)
    }

    /// Register (or replace) the strategy for `scheme`.
    pub fn register<V>(mut self, scheme: impl Into<String>, verifier: V) -> Self
    where
        V: CredentialVerifier + 'static,
    {
        self.schemes.insert(scheme.into(), Arc::new(verifier));
        self
    }

    pub fn build(self) -> CredentialRegistry {
        CredentialRegistry {
            schemes: self.schemes,
        }
    }
}
