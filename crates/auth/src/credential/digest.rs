use std::marker::PhantomData;

use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

use super::CredentialVerifier;

/// Stored value is the secret itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainVerifier;

impl CredentialVerifier for PlainVerifier {
    fn verify(&self, candidate: &str, stored_hash: &str, _: &str, _: &str) -> bool {
        constant_time_eq(candidate, stored_hash)
    }
}

/// Iterated, salted hex digest.
///
/// `h = hex(D(secret))`, then `h = hex(D(h ++ account_salt))` when the account
/// salt is set, then `h = hex(D(h ++ organization_salt))` when the
/// organization salt is set.
pub struct SaltedDigestVerifier<D> {
    _digest: PhantomData<fn() -> D>,
}

pub type Sha256SaltVerifier = SaltedDigestVerifier<Sha256>;
pub type Sha512SaltVerifier = SaltedDigestVerifier<Sha512>;

impl<D: Digest> SaltedDigestVerifier<D> {
    pub fn new() -> Self {
        Self {
            _digest: PhantomData,
        }
    }

    /// Derive the stored form of `secret`.
    pub fn derive(secret: &str, account_salt: &str, organization_salt: &str) -> String {
        let mut hashed = hex_digest::<D>(secret);
        for salt in [account_salt, organization_salt] {
            if !salt.is_empty() {
                hashed.push_str(salt);
                hashed = hex_digest::<D>(&hashed);
            }
        }
        hashed
    }
}

impl<D: Digest> Default for SaltedDigestVerifier<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Digest + 'static> CredentialVerifier for SaltedDigestVerifier<D> {
    fn verify(
        &self,
        candidate: &str,
        stored_hash: &str,
        account_salt: &str,
        organization_salt: &str,
    ) -> bool {
        let derived = Self::derive(candidate, account_salt, organization_salt);
        constant_time_eq(&derived, stored_hash)
    }
}

fn hex_digest<D: Digest>(input: &str) -> String {
    hex::encode(D::digest(input.as_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
