use thiserror::Error;

/// Error type for session token operations.
///
/// Validation failures are deliberately coarse: apart from expiry, every
/// broken token collapses into [`JwtError::InvalidSignature`] so that
/// callers cannot be tempted to leak the distinction. HTTP layers are
/// expected to flatten all variants into an undifferentiated 401.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("authorization header does not match the bearer scheme")]
    MalformedHeader,

    #[error("token signature, format, or algorithm is invalid")]
    InvalidSignature,

    #[error("token is expired")]
    Expired,

    #[error("token carries no subject")]
    MissingSubject,

    #[error("failed to encode token: {0}")]
    EncodingFailed(String),
}
