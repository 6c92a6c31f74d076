use async_trait::async_trait;

use crate::domain::account::models::AccountId;
use crate::domain::event::errors::EventError;
use crate::domain::event::models::EventKind;

/// Append-only persistence for audit events.
#[async_trait]
pub trait EventRecorder: Send + Sync + 'static {
    /// Append one audit event, optionally annotated with a key/value pair
    /// (for example `instance = <id>` on lifecycle events).
    ///
    /// # Errors
    /// * `EventError` - the append failed; callers log and continue
    async fn record(
        &self,
        account_id: AccountId,
        kind: EventKind,
        detail: Option<(String, String)>,
    ) -> Result<(), EventError>;
}
