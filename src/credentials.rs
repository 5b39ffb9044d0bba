//! One-way password hashing (argon2id)
//!
//! Hashes are stored as PHC strings, so salt and cost parameters travel with
//! the hash and old hashes keep verifying after a cost change.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest password accepted for hashing, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashingError {
    #[error("Password exceeds {max} bytes")]
    PasswordTooLong { max: usize },

    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Hashing failed: {0}")]
    Failed(String),
}

/// Argon2 cost parameters
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Password hasher with fixed cost parameters
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    #[cfg(test)]
    verify_calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

impl CredentialHasher {
    pub fn new(config: HashingConfig) -> Result<Self, HashingError> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| HashingError::InvalidParams(e.to_string()))?;
        Ok(Self::with_params(params))
    }

    fn with_params(params: Params) -> Self {
        Self {
            params,
            #[cfg(test)]
            verify_calls: Default::default(),
        }
    }

    /// Number of `verify` calls made through this hasher or its clones
    #[cfg(test)]
    pub(crate) fn verify_calls(&self) -> usize {
        self.verify_calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String, HashingError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(HashingError::PasswordTooLong {
                max: MAX_PASSWORD_BYTES,
            });
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashingError::Failed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a candidate against a stored hash.
    ///
    /// A malformed stored hash verifies as `false`.
    pub fn verify(&self, stored_hash: &str, candidate: &str) -> bool {
        #[cfg(test)]
        self.verify_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            tracing::warn!("Stored credential hash is not a valid PHC string");
            return false;
        };
        self.argon2()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(HashingConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}
