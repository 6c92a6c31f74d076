use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use chrono::Duration;
use chrono::Utc;
use cumulus_service::domain::account::errors::AccountError;
use cumulus_service::domain::account::models::Account;
use cumulus_service::domain::account::models::AccountId;
use cumulus_service::domain::account::models::AccountName;
use cumulus_service::domain::account::models::ApiAccess;
use cumulus_service::domain::account::models::EmailAddress;
use cumulus_service::domain::account::models::NewAccount;
use cumulus_service::domain::account::models::NewApiKey;
use cumulus_service::domain::account::models::Role;
use cumulus_service::domain::account::ports::AccountRepository;
use cumulus_service::domain::account::service::AccountService;
use cumulus_service::domain::event::errors::EventError;
use cumulus_service::domain::event::models::EventKind;
use cumulus_service::domain::event::ports::EventRecorder;
use cumulus_service::domain::instance::errors::ProviderError;
use cumulus_service::domain::instance::models::Instance;
use cumulus_service::domain::instance::models::InstanceId;
use cumulus_service::domain::instance::ports::CloudProvider;
use cumulus_service::domain::instance::service::InstanceService;
use cumulus_service::domain::reset::errors::MailError;
use cumulus_service::domain::reset::errors::ResetError;
use cumulus_service::domain::reset::models::ResetRecord;
use cumulus_service::domain::reset::ports::Mailer;
use cumulus_service::domain::reset::ports::ResetRepository;
use cumulus_service::domain::reset::service::ResetService;
use cumulus_service::inbound::http::router::create_router;
use cumulus_service::inbound::http::router::AppState;
use uuid::Uuid;

pub const TEST_SECRET: &[u8] = b"integration_test_secret_long_enough_for_hs512!";
pub const TEST_TENANT: &str = "classroom";

/// In-memory stand-in for the Postgres repositories. One mutex around
/// the whole store keeps the cross-table operations (redeem) atomic the
/// way the real transaction does.
pub struct TestStore {
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    accounts: Vec<Account>,
    next_id: i64,
    resets: HashMap<i64, ResetRecord>,
    events: Vec<RecordedEvent>,
    api_access: HashMap<String, ApiAccess>,
}

#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub account_id: AccountId,
    pub kind: EventKind,
    pub detail: Option<(String, String)>,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                accounts: Vec::new(),
                next_id: 1,
                resets: HashMap::new(),
                events: Vec::new(),
                api_access: HashMap::new(),
            }),
        }
    }

    pub fn add_account(&self, name: &str, email: &str, password_hash: String) -> AccountId {
        let mut inner = self.inner.lock().unwrap();
        let id = AccountId(inner.next_id);
        inner.next_id += 1;
        inner.accounts.push(Account {
            id,
            name: AccountName::new(name.to_string()).unwrap(),
            role: Role::Student,
            email: EmailAddress::new(email.to_string()).unwrap(),
            tenant: TEST_TENANT.to_string(),
            password_hash,
            registered: Utc::now(),
        });
        id
    }

    pub fn add_api_access(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.api_access.insert(
            TEST_TENANT.to_string(),
            ApiAccess {
                zone: "ch-gva-2".to_string(),
                key: "EXOtest".to_string(),
                secret: "sekrit".to_string(),
            },
        );
    }

    pub fn reset_count(&self) -> usize {
        self.inner.lock().unwrap().resets.len()
    }

    /// Shift an account's reset record into the past, as if the clock
    /// had advanced.
    pub fn age_reset(&self, account_id: AccountId, by: Duration) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(record) = inner.resets.get_mut(&account_id.0) {
            record.created -= by;
            record.expires -= by;
        }
    }

    pub fn events_of_kind(&self, kind: EventKind) -> Vec<RecordedEvent> {
        self.inner
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|event| event.kind == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AccountRepository for TestStore {
    async fn insert(&self, account: &NewAccount) -> Result<Account, AccountError> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .accounts
            .iter()
            .any(|existing| existing.name == account.name)
        {
            return Err(AccountError::NameAlreadyExists(
                account.name.as_str().to_string(),
            ));
        }
        if inner
            .accounts
            .iter()
            .any(|existing| existing.email == account.email)
        {
            return Err(AccountError::EmailAlreadyExists(
                account.email.as_str().to_string(),
            ));
        }
        let id = AccountId(inner.next_id);
        inner.next_id += 1;
        let account = Account {
            id,
            name: account.name.clone(),
            role: account.role,
            email: account.email.clone(),
            tenant: account.tenant.clone(),
            password_hash: account.password_hash.clone(),
            registered: account.registered,
        };
        inner.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_name(&self, name: &AccountName) -> Result<Option<Account>, AccountError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .accounts
            .iter()
            .find(|account| &account.name == name)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .accounts
            .iter()
            .find(|account| account.email.as_str() == email)
            .cloned())
    }

    async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), AccountError> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .iter_mut()
            .find(|account| account.id == id)
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        account.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn find_api_access(
        &self,
        name: &AccountName,
    ) -> Result<Option<ApiAccess>, AccountError> {
        let inner = self.inner.lock().unwrap();
        let Some(account) = inner.accounts.iter().find(|account| &account.name == name) else {
            return Ok(None);
        };
        Ok(inner.api_access.get(&account.tenant).cloned())
    }

    async fn insert_api_key(&self, key: &NewApiKey) -> Result<(), AccountError> {
        let mut inner = self.inner.lock().unwrap();
        inner.api_access.insert(
            key.tenant.clone(),
            ApiAccess {
                zone: key.zone.clone(),
                key: key.key.clone(),
                secret: key.secret.clone(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl ResetRepository for TestStore {
    async fn find_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Option<ResetRecord>, ResetError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.resets.get(&account_id.0).cloned())
    }

    async fn upsert(&self, record: &ResetRecord) -> Result<(), ResetError> {
        let mut inner = self.inner.lock().unwrap();
        inner.resets.insert(record.account_id.0, record.clone());
        Ok(())
    }

    async fn redeem(
        &self,
        account_id: AccountId,
        new_password_hash: &str,
    ) -> Result<(), ResetError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.resets.remove(&account_id.0).is_none() {
            return Err(ResetError::AlreadyConsumed);
        }
        let account = inner
            .accounts
            .iter_mut()
            .find(|account| account.id == account_id)
            .ok_or_else(|| ResetError::Database("account vanished".to_string()))?;
        account.password_hash = new_password_hash.to_string();
        Ok(())
    }
}

#[async_trait]
impl EventRecorder for TestStore {
    async fn record(
        &self,
        account_id: AccountId,
        kind: EventKind,
        detail: Option<(String, String)>,
    ) -> Result<(), EventError> {
        let mut inner = self.inner.lock().unwrap();
        inner.events.push(RecordedEvent {
            account_id,
            kind,
            detail,
        });
        Ok(())
    }
}

/// Canned cloud provider: a fixed instance pool, with start/stop calls
/// recorded.
pub struct StaticCloud {
    instances: Mutex<Vec<Instance>>,
    started: Mutex<Vec<InstanceId>>,
    stopped: Mutex<Vec<InstanceId>>,
}

impl StaticCloud {
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(Vec::new()),
            started: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
        }
    }

    pub fn add_instance(&self, owner: Option<&str>, state: &str) -> InstanceId {
        let id = InstanceId(Uuid::new_v4());
        let mut labels = HashMap::new();
        if let Some(owner) = owner {
            labels.insert("owner".to_string(), owner.to_string());
        }
        let mut instances = self.instances.lock().unwrap();
        let index = instances.len();
        instances.push(Instance {
            id,
            name: format!("vm-{}", index),
            labels,
            ip: Some("203.0.113.7".to_string()),
            state: state.to_string(),
        });
        id
    }

    pub fn started(&self) -> Vec<InstanceId> {
        self.started.lock().unwrap().clone()
    }

    pub fn stopped(&self) -> Vec<InstanceId> {
        self.stopped.lock().unwrap().clone()
    }
}

#[async_trait]
impl CloudProvider for StaticCloud {
    async fn list_instances(&self, _access: &ApiAccess) -> Result<Vec<Instance>, ProviderError> {
        Ok(self.instances.lock().unwrap().clone())
    }

    async fn get_instance(
        &self,
        _access: &ApiAccess,
        id: &InstanceId,
    ) -> Result<Option<Instance>, ProviderError> {
        Ok(self
            .instances
            .lock()
            .unwrap()
            .iter()
            .find(|instance| instance.id == *id)
            .cloned())
    }

    async fn start_instance(
        &self,
        _access: &ApiAccess,
        id: &InstanceId,
    ) -> Result<(), ProviderError> {
        self.started.lock().unwrap().push(*id);
        Ok(())
    }

    async fn stop_instance(
        &self,
        _access: &ApiAccess,
        id: &InstanceId,
    ) -> Result<(), ProviderError> {
        self.stopped.lock().unwrap().push(*id);
        Ok(())
    }
}

/// Captures outbound reset mails so tests can use the plaintext token.
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_token(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_reset_token(&self, recipient: &str, token: &str) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), token.to_string()));
        Ok(())
    }
}

/// Test application that spawns the real router on a random port,
/// backed by the in-memory fakes above.
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub store: Arc<TestStore>,
    pub cloud: Arc<StaticCloud>,
    pub mailer: Arc<RecordingMailer>,
    pub authenticator: Arc<Authenticator>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store = Arc::new(TestStore::new());
        let cloud = Arc::new(StaticCloud::new());
        let mailer = Arc::new(RecordingMailer::new());
        let authenticator = Arc::new(Authenticator::new(TEST_SECRET));

        let account_service = Arc::new(AccountService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&authenticator),
        ));
        let reset_service = Arc::new(ResetService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&mailer),
        ));
        let instance_service = Arc::new(InstanceService::new(
            Arc::clone(&store),
            Arc::clone(&cloud),
            Arc::clone(&store),
        ));

        let state = AppState {
            accounts: account_service,
            resets: reset_service,
            instances: instance_service,
            authenticator: Arc::clone(&authenticator),
        };
        let router = create_router(state, &["http://localhost:4200".to_string()]);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server failed");
        });

        Self {
            address: format!("http://127.0.0.1:{port}"),
            api_client: reqwest::Client::new(),
            store,
            cloud,
            mailer,
            authenticator,
        }
    }

    /// Seed an account with a real Argon2id hash and return its id.
    pub fn seed_account(&self, name: &str, email: &str, password: &str) -> AccountId {
        let hash = self
            .authenticator
            .hash_password(password)
            .expect("Failed to hash password");
        self.store.add_account(name, email, hash)
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Log in over HTTP and return the session token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .post("/login")
            .json(&serde_json::json!({"username": username, "password": password}))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["token"].as_str().expect("token missing").to_string()
    }
}
