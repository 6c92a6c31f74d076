//! Authentication library
//!
//! Provides the credential infrastructure for the cumulus backend:
//! - Password hashing (Argon2id) for stored passwords and one-time tokens
//! - Password strength policy
//! - One-time token generation from a CSPRNG
//! - Session token (JWT, HS512) issuance and validation
//! - Bearer-header handling and authentication coordination
//!
//! The signing secret is injected at construction time and never lives in
//! this crate; services load it from their configuration.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::Authenticator;
//!
//! let auth = Authenticator::new(b"secret_key_at_least_32_bytes_long!");
//! let token = auth.issue_token("alice").unwrap();
//! let subject = auth
//!     .subject_from_header(&format!("Bearer {token}"))
//!     .unwrap();
//! assert_eq!(subject, "alice");
//! ```

pub mod authenticator;
pub mod jwt;
pub mod password;

pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use password::alphanumeric_token;
pub use password::is_sufficiently_strong;
pub use password::PasswordError;
pub use password::PasswordHasher;
