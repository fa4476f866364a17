//! Password hashing collaborator.
//!
//! The hasher is an explicit dependency handed to the credential service at
//! construction; nothing resolves it through a global.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::config::SecurityConfig;

/// Salted-hash generation and verification.
pub trait PasswordHasher: Send + Sync {
    /// Derives a fresh (hash, salt) pair for `password`.
    fn hash(&self, password: &str) -> Result<(String, String)>;

    /// Checks `password` against a stored pair. The salt travels separately in
    /// the identity record even when the hash format embeds it.
    fn verify(&self, password: &str, hash: &str, salt: &str) -> bool;
}

/// Argon2id implementation, parameterized from [`SecurityConfig`].
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<(String, String)> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

        Ok((hash.to_string(), salt.to_string()))
    }

    fn verify(&self, password: &str, hash: &str, _salt: &str) -> bool {
        // The PHC string carries its own salt; the separate salt column exists
        // for the record format, not for verification.
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hasher = Argon2Hasher::default();
        let (hash, salt) = hasher.hash("hunter2").unwrap();

        assert!(hasher.verify("hunter2", &hash, &salt));
        assert!(!hasher.verify("hunter3", &hash, &salt));
    }

    #[test]
    fn each_hash_gets_a_fresh_salt() {
        let hasher = Argon2Hasher::default();
        let (hash_a, salt_a) = hasher.hash("same").unwrap();
        let (hash_b, salt_b) = hasher.hash("same").unwrap();

        assert_ne!(salt_a, salt_b);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn garbage_stored_hash_fails_closed() {
        let hasher = Argon2Hasher::default();
        assert!(!hasher.verify("pw", "not-a-phc-string", ""));
    }
}
