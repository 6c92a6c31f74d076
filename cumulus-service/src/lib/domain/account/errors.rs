use thiserror::Error;

/// Error for AccountName validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountNameError {
    #[error("Account name too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Account name too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Account name contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for Role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("Unknown role: {0} (expected 'student' or 'teacher')")]
    Unknown(String),
}

/// Top-level error for account operations.
///
/// `InvalidCredentials` deliberately covers every login failure mode;
/// the distinction between an unknown name and a wrong password exists
/// only in server-side logs and audit events.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid account name: {0}")]
    InvalidName(#[from] AccountNameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid role: {0}")]
    InvalidRole(#[from] RoleError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password does not meet the strength policy")]
    WeakPassword,

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Account name already exists: {0}")]
    NameAlreadyExists(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("Token issuance failed: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    Database(String),
}
