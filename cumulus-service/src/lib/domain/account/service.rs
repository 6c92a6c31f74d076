use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Utc;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::AccountName;
use crate::domain::account::models::NewAccount;
use crate::domain::account::models::NewApiKey;
use crate::domain::account::models::RegisterAccountCommand;
use crate::domain::account::ports::AccountRepository;
use crate::domain::account::ports::AccountServicePort;
use crate::domain::event::models::EventKind;
use crate::domain::event::ports::EventRecorder;

/// Domain service for account operations: login, registration, and
/// direct password changes.
pub struct AccountService<AR, EV>
where
    AR: AccountRepository,
    EV: EventRecorder,
{
    repository: Arc<AR>,
    events: Arc<EV>,
    authenticator: Arc<Authenticator>,
}

impl<AR, EV> AccountService<AR, EV>
where
    AR: AccountRepository,
    EV: EventRecorder,
{
    pub fn new(repository: Arc<AR>, events: Arc<EV>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            events,
            authenticator,
        }
    }

    /// Register a new account. Used by operator tooling, not exposed
    /// over HTTP.
    ///
    /// # Errors
    /// * `NameAlreadyExists` | `EmailAlreadyExists` - account exists
    /// * `Password` - hashing failed
    /// * `Database` - persistence failed
    pub async fn register(
        &self,
        command: RegisterAccountCommand,
    ) -> Result<Account, AccountError> {
        let password_hash = self.authenticator.hash_password(&command.password)?;

        let account = self
            .repository
            .insert(&NewAccount {
                name: command.name,
                role: command.role,
                email: command.email,
                tenant: command.tenant,
                password_hash,
                registered: Utc::now(),
            })
            .await?;

        self.record_event(
            account.id,
            EventKind::AccountCreated,
            Some(("name".to_string(), account.name.to_string())),
        )
        .await;

        Ok(account)
    }

    /// Set a new password for an account directly, bypassing the reset
    /// flow. Used by operator tooling; the strength policy still applies.
    ///
    /// # Errors
    /// * `WeakPassword` - fewer than eight distinct characters
    /// * `NotFound` - no such account
    /// * `Password` | `Database` - infrastructure failure
    pub async fn change_password(
        &self,
        name: &AccountName,
        new_password: &str,
    ) -> Result<(), AccountError> {
        if !auth::is_sufficiently_strong(new_password) {
            return Err(AccountError::WeakPassword);
        }

        let account = self
            .repository
            .find_by_name(name)
            .await?
            .ok_or_else(|| AccountError::NotFound(name.to_string()))?;

        let password_hash = self.authenticator.hash_password(new_password)?;
        self.repository
            .update_password_hash(account.id, &password_hash)
            .await
    }

    /// Store cloud-provider credentials for the tenant of an account.
    ///
    /// # Errors
    /// * `NotFound` - the named account does not exist
    /// * `Database` - persistence failed
    pub async fn add_api_key(
        &self,
        name: &AccountName,
        key: NewApiKey,
    ) -> Result<(), AccountError> {
        self.repository
            .find_by_name(name)
            .await?
            .ok_or_else(|| AccountError::NotFound(name.to_string()))?;

        self.repository.insert_api_key(&key).await
    }

    async fn record_event(
        &self,
        account_id: AccountId,
        kind: EventKind,
        detail: Option<(String, String)>,
    ) {
        if let Err(e) = self.events.record(account_id, kind, detail).await {
            tracing::error!(%account_id, %kind, error = %e, "Failed to record audit event");
        }
    }
}

#[async_trait]
impl<AR, EV> AccountServicePort for AccountService<AR, EV>
where
    AR: AccountRepository,
    EV: EventRecorder,
{
    async fn login(&self, username: &str, password: &str) -> Result<String, AccountError> {
        let name = match AccountName::new(username.to_string()) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(username, error = %e, "Login attempt with malformed name");
                return Err(AccountError::InvalidCredentials);
            }
        };

        let Some(account) = self.repository.find_by_name(&name).await? else {
            tracing::warn!(username, "Login attempt for unknown account");
            return Err(AccountError::InvalidCredentials);
        };

        match self
            .authenticator
            .login(password, &account.password_hash, account.name.as_str())
        {
            Ok(token) => {
                tracing::info!(username, "Successful login");
                self.record_event(account.id, EventKind::LoginSuccess, None)
                    .await;
                Ok(token)
            }
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::warn!(username, "Login attempt with wrong password");
                self.record_event(account.id, EventKind::LoginFailure, None)
                    .await;
                Err(AccountError::InvalidCredentials)
            }
            Err(AuthenticationError::Password(e)) => Err(AccountError::Password(e)),
            Err(AuthenticationError::Jwt(e)) => Err(AccountError::Token(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::domain::account::models::ApiAccess;
    use crate::domain::account::models::EmailAddress;
    use crate::domain::account::models::Role;
    use crate::domain::event::errors::EventError;

    mock! {
        pub TestAccountRepository {}

        #[async_trait]
        impl AccountRepository for TestAccountRepository {
            async fn insert(&self, account: &NewAccount) -> Result<Account, AccountError>;
            async fn find_by_name(&self, name: &AccountName) -> Result<Option<Account>, AccountError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError>;
            async fn update_password_hash(&self, id: AccountId, password_hash: &str) -> Result<(), AccountError>;
            async fn find_api_access(&self, name: &AccountName) -> Result<Option<ApiAccess>, AccountError>;
            async fn insert_api_key(&self, key: &NewApiKey) -> Result<(), AccountError>;
        }
    }

    mock! {
        pub TestEventRecorder {}

        #[async_trait]
        impl EventRecorder for TestEventRecorder {
            async fn record(&self, account_id: AccountId, kind: EventKind, detail: Option<(String, String)>) -> Result<(), EventError>;
        }
    }

    const SECRET: &[u8] = b"test_secret_key_that_is_long_enough_for_hs512_use!";

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(Authenticator::new(SECRET))
    }

    fn account_with_password(authenticator: &Authenticator, password: &str) -> Account {
        Account {
            id: AccountId(7),
            name: AccountName::new("alice".to_string()).unwrap(),
            role: Role::Student,
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            tenant: "classroom".to_string(),
            password_hash: authenticator.hash_password(password).unwrap(),
            registered: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_login_success_issues_valid_token_and_records_event() {
        let authenticator = authenticator();
        let account = account_with_password(&authenticator, "topsecret");

        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_name()
            .withf(|name| name.as_str() == "alice")
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));

        let mut events = MockTestEventRecorder::new();
        events
            .expect_record()
            .withf(|id, kind, detail| {
                *id == AccountId(7) && *kind == EventKind::LoginSuccess && detail.is_none()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = AccountService::new(
            Arc::new(repository),
            Arc::new(events),
            Arc::clone(&authenticator),
        );

        let token = service.login("alice", "topsecret").await.unwrap();
        let subject = authenticator
            .subject_from_header(&format!("Bearer {token}"))
            .unwrap();
        assert_eq!(subject, "alice");
    }

    #[tokio::test]
    async fn test_login_wrong_password_records_failure_event() {
        let authenticator = authenticator();
        let account = account_with_password(&authenticator, "topsecret");

        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_name()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));

        let mut events = MockTestEventRecorder::new();
        events
            .expect_record()
            .withf(|_, kind, _| *kind == EventKind::LoginFailure)
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = AccountService::new(Arc::new(repository), Arc::new(events), authenticator);

        let result = service.login("alice", "wrong").await;
        assert!(matches!(result, Err(AccountError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_account_fails_without_event() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_name()
            .times(1)
            .returning(|_| Ok(None));

        let mut events = MockTestEventRecorder::new();
        events.expect_record().times(0);

        let service = AccountService::new(Arc::new(repository), Arc::new(events), authenticator());

        let result = service.login("nobody", "whatever").await;
        assert!(matches!(result, Err(AccountError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_malformed_name_fails_without_lookup() {
        let mut repository = MockTestAccountRepository::new();
        repository.expect_find_by_name().times(0);

        let events = MockTestEventRecorder::new();

        let service = AccountService::new(Arc::new(repository), Arc::new(events), authenticator());

        let result = service.login("a b", "whatever").await;
        assert!(matches!(result, Err(AccountError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_records_event() {
        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_insert()
            .withf(|account| {
                account.name.as_str() == "bob"
                    && account.password_hash.starts_with("$argon2")
                    && account.password_hash != "hunter2hunter2"
            })
            .times(1)
            .returning(|account| {
                Ok(Account {
                    id: AccountId(1),
                    name: account.name.clone(),
                    role: account.role,
                    email: account.email.clone(),
                    tenant: account.tenant.clone(),
                    password_hash: account.password_hash.clone(),
                    registered: account.registered,
                })
            });

        let mut events = MockTestEventRecorder::new();
        events
            .expect_record()
            .withf(|id, kind, detail| {
                *id == AccountId(1)
                    && *kind == EventKind::AccountCreated
                    && *detail == Some(("name".to_string(), "bob".to_string()))
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = AccountService::new(Arc::new(repository), Arc::new(events), authenticator());

        let command = RegisterAccountCommand {
            name: AccountName::new("bob".to_string()).unwrap(),
            role: Role::Student,
            email: EmailAddress::new("bob@example.com".to_string()).unwrap(),
            tenant: "classroom".to_string(),
            password: "hunter2hunter2".to_string(),
        };

        let account = service.register(command).await.unwrap();
        assert_eq!(account.name.as_str(), "bob");
    }

    #[tokio::test]
    async fn test_change_password_rejects_weak_password() {
        let mut repository = MockTestAccountRepository::new();
        repository.expect_find_by_name().times(0);

        let service = AccountService::new(
            Arc::new(repository),
            Arc::new(MockTestEventRecorder::new()),
            authenticator(),
        );

        let name = AccountName::new("alice".to_string()).unwrap();
        let result = service.change_password(&name, "aaaaaaaa").await;
        assert!(matches!(result, Err(AccountError::WeakPassword)));
    }

    #[tokio::test]
    async fn test_change_password_updates_hash() {
        let authenticator = authenticator();
        let account = account_with_password(&authenticator, "old_password");

        let mut repository = MockTestAccountRepository::new();
        repository
            .expect_find_by_name()
            .times(1)
            .returning(move |_| Ok(Some(account.clone())));
        repository
            .expect_update_password_hash()
            .withf(|id, hash| *id == AccountId(7) && hash.starts_with("$argon2"))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = AccountService::new(
            Arc::new(repository),
            Arc::new(MockTestEventRecorder::new()),
            authenticator,
        );

        let name = AccountName::new("alice".to_string()).unwrap();
        service
            .change_password(&name, "fresh new password")
            .await
            .unwrap();
    }
}
