use thiserror::Error;

/// Error for outbound reset-mail delivery.
#[derive(Debug, Clone, Error)]
#[error("Failed to deliver reset email: {0}")]
pub struct MailError(pub String);

/// Top-level error for the password-reset flow.
///
/// The request path never surfaces `UnknownAccount` to callers (the
/// service swallows it before it becomes an error); the confirm path may
/// distinguish its rejections server-side, but HTTP layers flatten all
/// of them into the same 400.
#[derive(Debug, Error)]
pub enum ResetError {
    #[error("Password does not meet the strength policy")]
    WeakPassword,

    #[error("A reset was requested too recently for this account")]
    RateLimited,

    #[error("No account for this email address")]
    UnknownAccount,

    #[error("No pending reset request for this account")]
    NoPendingRequest,

    #[error("The reset request has expired")]
    Expired,

    #[error("The supplied token does not match the pending request")]
    TokenMismatch,

    #[error("The reset request was already consumed")]
    AlreadyConsumed,

    #[error("Hashing error: {0}")]
    Hashing(#[from] auth::PasswordError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("Database error: {0}")]
    Database(String),
}
