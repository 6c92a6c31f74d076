use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Fixed validity window for issued session tokens.
///
/// Invalidation is purely time-based; there is no revocation list.
pub const TOKEN_VALIDITY_HOURS: i64 = 24;

/// Session token claim set.
///
/// Deliberately minimal: the subject identifies the account, and the
/// issued-at/expiry pair bounds the session. The subject is optional on
/// the wire so that a token without one is detected as such during
/// validation instead of failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Build the claim set for a freshly issued session token.
    ///
    /// Expiry is issuance time plus [`TOKEN_VALIDITY_HOURS`].
    pub fn for_subject(subject: impl Into<String>) -> Self {
        let iat = Utc::now();
        let exp = iat + Duration::hours(TOKEN_VALIDITY_HOURS);
        Self {
            sub: Some(subject.into()),
            iat: iat.timestamp(),
            exp: exp.timestamp(),
        }
    }
}
