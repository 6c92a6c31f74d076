use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;

use crate::domain::account::errors::AccountNameError;
use crate::domain::account::errors::EmailError;
use crate::domain::account::errors::RoleError;

/// Account aggregate entity.
///
/// One row per registered user. The password hash is the Argon2id PHC
/// string; the tenant groups accounts onto shared cloud-provider
/// credentials.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub name: AccountName,
    pub role: Role,
    pub email: EmailAddress,
    pub tenant: String,
    pub password_hash: String,
    pub registered: DateTime<Utc>,
}

/// Account identifier as assigned by the datastore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Account role. Roles do not grant permissions beyond what the
/// ownership label check allows; they group accounts for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            other => Err(RoleError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account name value type.
///
/// Doubles as the token subject and as the value of the `owner` label on
/// cloud instances, so the character set stays deliberately narrow:
/// 3-32 characters, alphanumeric plus underscore and hyphen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountName(String);

impl AccountName {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Validate and wrap a raw account name.
    ///
    /// # Errors
    /// * `TooShort` | `TooLong` - length outside 3-32 characters
    /// * `InvalidCharacters` - anything beyond alphanumeric, `_`, `-`
    pub fn new(name: String) -> Result<Self, AccountNameError> {
        let length = name.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(AccountNameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            });
        }
        if length > Self::MAX_LENGTH {
            return Err(AccountNameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            });
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AccountNameError::InvalidCharacters);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address value type, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and wrap a raw email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - not RFC 5322 conformant
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-tenant credentials for the cloud-provider API, resolved from the
/// datastore by joining the account's tenant onto the stored API keys.
#[derive(Debug, Clone)]
pub struct ApiAccess {
    pub zone: String,
    pub key: String,
    pub secret: String,
}

/// Command to register a new account; the plaintext password is hashed
/// by the service before it reaches any port.
#[derive(Debug)]
pub struct RegisterAccountCommand {
    pub name: AccountName,
    pub role: Role,
    pub email: EmailAddress,
    pub tenant: String,
    pub password: String,
}

/// A fully prepared account row awaiting its datastore-assigned id.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: AccountName,
    pub role: Role,
    pub email: EmailAddress,
    pub tenant: String,
    pub password_hash: String,
    pub registered: DateTime<Utc>,
}

/// Per-tenant API key record for the cloud provider.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub zone: String,
    pub key: String,
    pub secret: String,
    pub tenant: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_name_valid() {
        let name = AccountName::new("alice-01".to_string()).unwrap();
        assert_eq!(name.as_str(), "alice-01");
    }

    #[test]
    fn test_account_name_length_bounds() {
        assert!(matches!(
            AccountName::new("al".to_string()),
            Err(AccountNameError::TooShort { .. })
        ));
        assert!(matches!(
            AccountName::new("a".repeat(33)),
            Err(AccountNameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_account_name_rejects_invalid_characters() {
        assert!(matches!(
            AccountName::new("alice bob".to_string()),
            Err(AccountNameError::InvalidCharacters)
        ));
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!("teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_email_address_validation() {
        assert!(EmailAddress::new("alice@example.com".to_string()).is_ok());
        assert!(EmailAddress::new("not-an-email".to_string()).is_err());
    }
}
