use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};

use super::CredentialVerifier;

/// Argon2id PHC strings (`$argon2id$v=19$...`).
///
/// The salt lives inside the PHC string, so the account and organization
/// salts are not consulted.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2idVerifier;

impl CredentialVerifier for Argon2idVerifier {
    fn verify(&self, candidate: &str, stored_hash: &str, _: &str, _: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "stored argon2 hash is not a valid PHC string");
                return false;
            }
        };

        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use argon2::password_hash::{PasswordHasher, SaltString};

    use super::*;

    fn hash(secret: &str) -> String {
        let salt = SaltString::from_b64("c2FsdHlzYWx0eXNhbHR5").unwrap();
        Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn verifies_matching_secret() {
        let stored = hash("correct horse");
        assert!(stored.starts_with("$argon2id$"));
        assert!(Argon2idVerifier.verify("correct horse", &stored, "ignored", "ignored"));
    }

    #[test]
    fn rejects_wrong_secret() {
        let stored = hash("correct horse");
        assert!(!Argon2idVerifier.verify("battery staple", &stored, "", ""));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!Argon2idVerifier.verify("anything", "not-a-phc-string", "", ""));
        assert!(!Argon2idVerifier.verify("", "", "", ""));
    }
}
