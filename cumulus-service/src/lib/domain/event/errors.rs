use thiserror::Error;

/// Error for audit event recording.
///
/// Recording is best-effort: callers log the failure and carry on with
/// the flow that produced the event.
#[derive(Debug, Clone, Error)]
#[error("Failed to record audit event: {0}")]
pub struct EventError(pub String);
