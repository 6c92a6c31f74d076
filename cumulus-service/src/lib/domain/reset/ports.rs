use async_trait::async_trait;

use crate::domain::account::models::AccountId;
use crate::domain::reset::errors::MailError;
use crate::domain::reset::errors::ResetError;
use crate::domain::reset::models::ResetRecord;

/// Port for the password-reset operations exposed over HTTP.
#[async_trait]
pub trait ResetServicePort: Send + Sync + 'static {
    /// Open (or refuse to refresh) a reset request for the account
    /// behind `email`. Unknown emails succeed indistinguishably.
    ///
    /// # Errors
    /// * `RateLimited` - a pending request is younger than the cooldown
    /// * `Hashing` | `Mail` | `Database` - infrastructure failure
    async fn request_reset(&self, email: &str) -> Result<(), ResetError>;

    /// Redeem a pending reset request: verify the one-time token and
    /// atomically set the new password while consuming the record.
    ///
    /// # Errors
    /// * `WeakPassword` - policy rejection, checked first
    /// * `UnknownAccount` | `NoPendingRequest` | `Expired` |
    ///   `TokenMismatch` | `AlreadyConsumed` - rejection
    /// * `Hashing` | `Database` - infrastructure failure
    async fn confirm_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), ResetError>;
}

/// Persistence for reset records. One record per account, enforced by
/// the store.
#[async_trait]
pub trait ResetRepository: Send + Sync + 'static {
    /// Look up the account's record, expired or not. Expiry is judged by
    /// the caller so that "expired" and "absent" stay distinguishable in
    /// server-side logs.
    ///
    /// # Errors
    /// * `Database` - operation failed
    async fn find_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Option<ResetRecord>, ResetError>;

    /// Insert the record, replacing any existing one for the same
    /// account in a single atomic step.
    ///
    /// # Errors
    /// * `Database` - operation failed
    async fn upsert(&self, record: &ResetRecord) -> Result<(), ResetError>;

    /// Consume the account's record and set the new password hash in one
    /// transaction. Fails with `AlreadyConsumed` when the record vanished
    /// between verification and redemption (concurrent confirm).
    ///
    /// # Errors
    /// * `AlreadyConsumed` - no record left to consume
    /// * `Database` - operation failed
    async fn redeem(
        &self,
        account_id: AccountId,
        new_password_hash: &str,
    ) -> Result<(), ResetError>;
}

/// Outbound delivery of the plaintext one-time token to the account
/// holder.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Send the reset email. One attempt, no retry; failures are hard
    /// errors surfaced to the caller.
    ///
    /// # Errors
    /// * `MailError` - delivery failed
    async fn send_reset_token(&self, recipient: &str, token: &str) -> Result<(), MailError>;
}
