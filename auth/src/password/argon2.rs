use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// One-way hasher for stored credentials.
///
/// Used for account passwords and for one-time reset tokens alike: both
/// are secrets a database leak must not reveal. Internally Argon2id with
/// the library's default cost parameters and a fresh random salt per
/// hash. Verification time does not depend on where a mismatch occurs.
pub struct PasswordHasher {
    algorithm: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a hasher with the default cost parameters.
    pub fn new() -> Self {
        Self {
            algorithm: Argon2::default(),
        }
    }

    /// Hash a secret for storage.
    ///
    /// Returns the PHC string form, which carries algorithm, parameters,
    /// and salt alongside the digest.
    ///
    /// # Errors
    /// * `HashingFailed` - the hashing operation itself failed
    pub fn hash(&self, secret: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.algorithm
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a secret against a stored PHC hash.
    ///
    /// A mismatch is `Ok(false)`; only an unparseable hash is an error.
    ///
    /// # Errors
    /// * `VerificationFailed` - the stored hash is not a valid PHC string
    pub fn verify(&self, secret: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            PasswordError::VerificationFailed(format!("Invalid password hash: {}", e))
        })?;

        Ok(self
            .algorithm
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
