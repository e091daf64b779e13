/// Password Hashing and Verification
///
/// Salted bcrypt hashes. The hash is carried as raw bytes so it can be
/// stored as-is in a `BYTEA` column.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password using bcrypt with a fresh random salt
    ///
    /// # Errors
    /// Returns `AppError::Hashing` if bcrypt fails (invalid cost or RNG failure)
    pub fn hash(&self, password: &str) -> Result<Vec<u8>, AppError> {
        hash(password, self.cost)
            .map(String::into_bytes)
            .map_err(|e| AppError::Hashing(e.to_string()))
    }

    /// Verify a password against its hash
    ///
    /// A mismatch is `Ok(false)`. Only a malformed hash is an error.
    pub fn verify(&self, password: &str, password_hash: &[u8]) -> Result<bool, AppError> {
        let encoded = std::str::from_utf8(password_hash)
            .map_err(|_| AppError::Hashing("stored hash is not valid UTF-8".to_string()))?;

        verify(password, encoded).map_err(|e| AppError::Hashing(e.to_string()))
    }
}
