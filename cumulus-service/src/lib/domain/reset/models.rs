use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::domain::account::models::AccountId;

/// Length of the generated one-time reset token, in characters.
pub const RESET_TOKEN_LENGTH: usize = 64;

/// Minimum age an existing request must reach before a new one is
/// accepted for the same account.
pub fn request_cooldown() -> Duration {
    Duration::minutes(5)
}

/// How long a reset request stays redeemable. Bounded and deliberately
/// longer than the request cooldown.
pub fn request_lifetime() -> Duration {
    Duration::hours(1)
}

/// The persisted, single-use link between an account and a hashed
/// one-time reset token.
///
/// At most one record exists per account at any time; a new request
/// either creates the first record or replaces a stale one wholesale.
/// The plaintext token exists only in the email sent to the account
/// holder.
#[derive(Debug, Clone)]
pub struct ResetRecord {
    pub account_id: AccountId,
    pub token_hash: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl ResetRecord {
    /// An expired record is treated as absent on lookup.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires < now
    }

    /// True while the record is too young to be replaced by a new
    /// request.
    pub fn in_cooldown(&self, now: DateTime<Utc>) -> bool {
        now < self.created + request_cooldown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_created_at(created: DateTime<Utc>) -> ResetRecord {
        ResetRecord {
            account_id: AccountId(1),
            token_hash: "$argon2id$irrelevant".to_string(),
            created,
            expires: created + request_lifetime(),
        }
    }

    #[test]
    fn test_cooldown_window() {
        let now = Utc::now();
        assert!(record_created_at(now).in_cooldown(now));
        assert!(record_created_at(now - Duration::minutes(4)).in_cooldown(now));
        assert!(!record_created_at(now - Duration::minutes(6)).in_cooldown(now));
    }

    #[test]
    fn test_expiry_window() {
        let now = Utc::now();
        assert!(!record_created_at(now - Duration::minutes(59)).is_expired(now));
        assert!(record_created_at(now - Duration::minutes(61)).is_expired(now));
    }
}
