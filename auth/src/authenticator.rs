use std::sync::OnceLock;

use regex::Regex;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Anchored bearer pattern: case-sensitive scheme, single space.
fn bearer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^Bearer (.+)$").expect("bearer pattern is a valid regex"))
}

/// Authentication coordinator combining password verification and session
/// token handling.
///
/// The one place where "credentials in, token out" and "header in,
/// subject out" are wired together; HTTP layers hold exactly one of
/// these per process.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Jwt(#[from] JwtError),
}

impl Authenticator {
    /// Create an authenticator around the configured signing secret.
    pub fn new(jwt_secret: &[u8]) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(jwt_secret),
        }
    }

    /// Hash a password or one-time token for storage.
    ///
    /// # Errors
    /// * `PasswordError` - hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify a secret against a stored hash.
    ///
    /// # Errors
    /// * `PasswordError` - the stored hash is malformed
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, hash)
    }

    /// Verify credentials against a stored hash and issue a session token
    /// for the subject.
    ///
    /// # Errors
    /// * `InvalidCredentials` - the password does not match
    /// * `Password` - verification failed outright
    /// * `Jwt` - token issuance failed
    pub fn login(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
    ) -> Result<String, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }
        Ok(self.issue_token(subject)?)
    }

    /// Issue a signed session token for a subject.
    ///
    /// # Errors
    /// * `EncodingFailed` - serialization or signing failed
    pub fn issue_token(&self, subject: &str) -> Result<String, JwtError> {
        self.jwt_handler.encode(&Claims::for_subject(subject))
    }

    /// Extract and validate the bearer token of an `Authorization` header
    /// value, returning the authenticated subject.
    ///
    /// The header must match `Bearer <token>` exactly (case-sensitive
    /// scheme, single space) after trimming surrounding whitespace.
    ///
    /// # Errors
    /// * `MalformedHeader` - the header does not match the bearer scheme
    /// * `InvalidSignature` | `Expired` | `MissingSubject` - see
    ///   [`JwtHandler::validate`]
    pub fn subject_from_header(&self, header: &str) -> Result<String, JwtError> {
        let captures = bearer_pattern()
            .captures(header.trim())
            .ok_or(JwtError::MalformedHeader)?;
        let token = captures[1].trim();
        self.jwt_handler.validate(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_that_is_long_enough_for_hs512_use!";

    #[test]
    fn test_login_success() {
        let authenticator = Authenticator::new(SECRET);

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");
        let token = authenticator
            .login("my_password", &hash, "alice")
            .expect("Login failed");

        let subject = authenticator
            .subject_from_header(&format!("Bearer {token}"))
            .expect("Failed to validate token");
        assert_eq!(subject, "alice");
    }

    #[test]
    fn test_login_invalid_password() {
        let authenticator = Authenticator::new(SECRET);

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");
        let result = authenticator.login("wrong_password", &hash, "alice");

        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_subject_from_header_accepts_surrounding_whitespace() {
        let authenticator = Authenticator::new(SECRET);
        let token = authenticator.issue_token("alice").expect("Failed to issue");

        let subject = authenticator
            .subject_from_header(&format!("  Bearer {token} "))
            .expect("Failed to validate token");
        assert_eq!(subject, "alice");
    }

    #[test]
    fn test_subject_from_header_rejects_malformed_headers() {
        let authenticator = Authenticator::new(SECRET);
        let token = authenticator.issue_token("alice").expect("Failed to issue");

        for header in [
            "".to_string(),
            "Bearer".to_string(),
            format!("bearer {token}"),
            format!("BEARER {token}"),
            format!("Token {token}"),
            format!("Bearer{token}"),
        ] {
            assert_eq!(
                authenticator.subject_from_header(&header),
                Err(JwtError::MalformedHeader),
                "header {header:?} should be rejected as malformed"
            );
        }
    }

    #[test]
    fn test_subject_from_header_rejects_foreign_token() {
        let authenticator = Authenticator::new(SECRET);
        let foreign = Authenticator::new(b"another_secret_that_is_also_long_enough!");
        let token = foreign.issue_token("alice").expect("Failed to issue");

        assert_eq!(
            authenticator.subject_from_header(&format!("Bearer {token}")),
            Err(JwtError::InvalidSignature)
        );
    }
}
