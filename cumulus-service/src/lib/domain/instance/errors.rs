use thiserror::Error;

/// Error for InstanceId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstanceIdError {
    #[error("Invalid instance ID format: {0}")]
    InvalidFormat(String),
}

/// Error for cloud-provider calls.
#[derive(Debug, Clone, Error)]
#[error("Cloud provider call failed: {0}")]
pub struct ProviderError(pub String);

/// Top-level error for instance operations.
///
/// `Unauthorized` covers ownership mismatch, missing owner label,
/// nonexistent instance, and missing API credentials alike: callers
/// must not be able to tell whether an instance exists or whom it
/// belongs to.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("Not authorized for this instance")]
    Unauthorized,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(String),
}
