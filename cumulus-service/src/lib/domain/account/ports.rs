use async_trait::async_trait;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::AccountName;
use crate::domain::account::models::ApiAccess;
use crate::domain::account::models::NewAccount;
use crate::domain::account::models::NewApiKey;

/// Port for the login operation exposed over HTTP.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Verify credentials and issue a session token.
    ///
    /// Every failure mode a caller could probe (unknown name, wrong
    /// password, malformed name) collapses into `InvalidCredentials`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - authentication failed
    /// * `Database` | `Password` | `Token` - infrastructure failure
    async fn login(&self, username: &str, password: &str) -> Result<String, AccountError>;
}

/// Persistence operations for the account aggregate and its per-tenant
/// API credentials.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist a new account, returning it with its assigned id.
    ///
    /// # Errors
    /// * `NameAlreadyExists` | `EmailAlreadyExists` - unique violation
    /// * `Database` - operation failed
    async fn insert(&self, account: &NewAccount) -> Result<Account, AccountError>;

    /// Retrieve an account by its unique name.
    ///
    /// # Errors
    /// * `Database` - operation failed
    async fn find_by_name(&self, name: &AccountName) -> Result<Option<Account>, AccountError>;

    /// Retrieve an account by its unique email address.
    ///
    /// # Errors
    /// * `Database` - operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;

    /// Overwrite the stored password hash of an account.
    ///
    /// # Errors
    /// * `NotFound` - no account with this id
    /// * `Database` - operation failed
    async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), AccountError>;

    /// Resolve the cloud-provider credentials for an account via its
    /// tenant. `None` when no key is configured for the tenant.
    ///
    /// # Errors
    /// * `Database` - operation failed
    async fn find_api_access(&self, name: &AccountName)
        -> Result<Option<ApiAccess>, AccountError>;

    /// Store cloud-provider credentials for a tenant.
    ///
    /// # Errors
    /// * `Database` - operation failed
    async fn insert_api_key(&self, key: &NewApiKey) -> Result<(), AccountError>;
}
