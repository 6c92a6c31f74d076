use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use chrono::Utc;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::AccountId;
use crate::domain::account::ports::AccountRepository;
use crate::domain::event::models::EventKind;
use crate::domain::event::ports::EventRecorder;
use crate::domain::reset::errors::ResetError;
use crate::domain::reset::models::request_lifetime;
use crate::domain::reset::models::ResetRecord;
use crate::domain::reset::models::RESET_TOKEN_LENGTH;
use crate::domain::reset::ports::Mailer;
use crate::domain::reset::ports::ResetRepository;
use crate::domain::reset::ports::ResetServicePort;

/// Domain service for the password-reset state machine.
///
/// Per account the states are `NoRequest -> Pending -> Consumed`, with
/// expired records falling back to `NoRequest` implicitly (they are
/// treated as absent). The store's one-record-per-account constraint
/// keeps concurrent requests from forking the state.
pub struct ResetService<AR, RR, EV, MA>
where
    AR: AccountRepository,
    RR: ResetRepository,
    EV: EventRecorder,
    MA: Mailer,
{
    accounts: Arc<AR>,
    resets: Arc<RR>,
    events: Arc<EV>,
    mailer: Arc<MA>,
    hasher: PasswordHasher,
}

impl<AR, RR, EV, MA> ResetService<AR, RR, EV, MA>
where
    AR: AccountRepository,
    RR: ResetRepository,
    EV: EventRecorder,
    MA: Mailer,
{
    pub fn new(accounts: Arc<AR>, resets: Arc<RR>, events: Arc<EV>, mailer: Arc<MA>) -> Self {
        Self {
            accounts,
            resets,
            events,
            mailer,
            hasher: PasswordHasher::new(),
        }
    }

    async fn record_event(&self, account_id: AccountId, kind: EventKind) {
        if let Err(e) = self.events.record(account_id, kind, None).await {
            tracing::error!(%account_id, %kind, error = %e, "Failed to record audit event");
        }
    }
}

fn account_lookup_error(e: AccountError) -> ResetError {
    ResetError::Database(e.to_string())
}

#[async_trait]
impl<AR, RR, EV, MA> ResetServicePort for ResetService<AR, RR, EV, MA>
where
    AR: AccountRepository,
    RR: ResetRepository,
    EV: EventRecorder,
    MA: Mailer,
{
    async fn request_reset(&self, email: &str) -> Result<(), ResetError> {
        let account = match self
            .accounts
            .find_by_email(email)
            .await
            .map_err(account_lookup_error)?
        {
            Some(account) => account,
            None => {
                // Indistinguishable from success: do not reveal whether
                // the address belongs to an account.
                tracing::warn!(email, "Password reset requested for unknown email");
                return Ok(());
            }
        };

        let now = Utc::now();
        if let Some(existing) = self.resets.find_for_account(account.id).await? {
            if existing.in_cooldown(now) {
                tracing::warn!(email, "Password reset requested too soon, rejecting");
                return Err(ResetError::RateLimited);
            }
        }

        let token = auth::alphanumeric_token(RESET_TOKEN_LENGTH);
        let token_hash = self.hasher.hash(&token)?;

        self.resets
            .upsert(&ResetRecord {
                account_id: account.id,
                token_hash,
                created: now,
                expires: now + request_lifetime(),
            })
            .await?;

        // Only the email ever carries the plaintext token.
        self.mailer
            .send_reset_token(account.email.as_str(), &token)
            .await?;
        tracing::info!(email, "Sent password reset email");

        self.record_event(account.id, EventKind::PasswordRequested)
            .await;

        Ok(())
    }

    async fn confirm_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), ResetError> {
        if !auth::is_sufficiently_strong(new_password) {
            tracing::warn!(email, "Rejecting password reset with weak password");
            return Err(ResetError::WeakPassword);
        }

        let account = self
            .accounts
            .find_by_email(email)
            .await
            .map_err(account_lookup_error)?
            .ok_or_else(|| {
                tracing::warn!(email, "Password reset confirmation for unknown email");
                ResetError::UnknownAccount
            })?;

        let record = self
            .resets
            .find_for_account(account.id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(email, "No pending reset request");
                ResetError::NoPendingRequest
            })?;

        let now = Utc::now();
        if record.is_expired(now) {
            tracing::warn!(email, expires = %record.expires, "Reset request expired");
            return Err(ResetError::Expired);
        }

        if !self.hasher.verify(token, &record.token_hash)? {
            tracing::warn!(email, "Reset token does not match the pending request");
            return Err(ResetError::TokenMismatch);
        }

        let password_hash = self.hasher.hash(new_password)?;
        self.resets.redeem(account.id, &password_hash).await?;
        tracing::info!(email, account_id = %account.id, "Password reset completed");

        self.record_event(account.id, EventKind::PasswordReset).await;

        Ok(())
    }
}
