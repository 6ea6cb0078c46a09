//! Salted one-way password hashing (Argon2id, PHC string format)

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;

use crate::{CnsError, Result};

/// Hashes and verifies user passwords.
///
/// Verification against an unknown account should still cost one full hash so
/// that a login attempt does not reveal whether the username exists; see
/// [`PasswordHasher::verify_dummy`].
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl PasswordHasher {
    /// Hasher with the Argon2id defaults recommended for interactive logins
    pub fn new() -> Result<Self> {
        Self::from_argon2(Argon2::default())
    }

    /// Hasher with explicit cost parameters (memory KiB, iterations, lanes)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| CnsError::Internal(format!("invalid argon2 params: {}", e)))?;
        Self::from_argon2(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn from_argon2(argon2: Argon2<'static>) -> Result<Self> {
        let mut hasher = PasswordHasher {
            argon2,
            dummy_hash: String::new(),
        };
        // random throwaway password: no input can ever verify against it
        let throwaway = Alphanumeric.sample_string(&mut rand::thread_rng(), 32);
        hasher.dummy_hash = hasher.hash(&throwaway)?;
        Ok(hasher)
    }

    /// Hash `password` with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| CnsError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Constant-time check of `password` against a stored PHC hash
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self.argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }

    /// Burn one verification for an account that does not exist. Always false.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.dummy_hash);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordHasher {
        PasswordHasher::with_params(8, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let hasher = cheap();
        let hash = hasher.hash("user123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("user123", &hash));
        assert!(!hasher.verify("user124", &hash));
    }

    #[test]
    fn salts_differ_per_hash() {
        let hasher = cheap();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("same", &a) && hasher.verify("same", &b));
    }

    #[test]
    fn unparseable_hash_never_verifies() {
        let hasher = cheap();
        assert!(!hasher.verify("anything", "plaintext-password"));
        assert!(!hasher.verify("", ""));
    }

    #[test]
    fn dummy_never_verifies() {
        let hasher = cheap();
        assert!(!hasher.verify_dummy(""));
        assert!(!hasher.verify_dummy("user123"));
    }

    #[test]
    fn hashes_verify_across_cost_settings() {
        // stored params win over the verifier's own
        let hash = cheap().hash("portable").unwrap();
        let other = PasswordHasher::with_params(16, 2, 1).unwrap();
        assert!(other.verify("portable", &hash));
    }
}
