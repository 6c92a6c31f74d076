use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountId;
use crate::domain::account::models::AccountName;
use crate::domain::account::models::ApiAccess;
use crate::domain::account::models::EmailAddress;
use crate::domain::account::models::NewAccount;
use crate::domain::account::models::NewApiKey;
use crate::domain::account::ports::AccountRepository;

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    name: String,
    role: String,
    email: String,
    tenant: String,
    password: String,
    registered: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AccountError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId(row.id),
            name: AccountName::new(row.name)?,
            role: row.role.parse()?,
            email: EmailAddress::new(row.email)?,
            tenant: row.tenant,
            password_hash: row.password,
            registered: row.registered,
        })
    }
}

const SELECT_ACCOUNT: &str =
    "SELECT id, name, role, email, tenant, password, registered FROM account";

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn insert(&self, account: &NewAccount) -> Result<Account, AccountError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO account (name, role, email, tenant, password, registered)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(account.name.as_str())
        .bind(account.role.as_str())
        .bind(account.email.as_str())
        .bind(&account.tenant)
        .bind(&account.password_hash)
        .bind(account.registered)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    if db_err.constraint() == Some("account_name_key") {
                        return AccountError::NameAlreadyExists(
                            account.name.as_str().to_string(),
                        );
                    }
                    if db_err.constraint() == Some("account_email_key") {
                        return AccountError::EmailAlreadyExists(
                            account.email.as_str().to_string(),
                        );
                    }
                }
            }
            AccountError::Database(e.to_string())
        })?;

        Ok(Account {
            id: AccountId(id),
            name: account.name.clone(),
            role: account.role,
            email: account.email.clone(),
            tenant: account.tenant.clone(),
            password_hash: account.password_hash.clone(),
            registered: account.registered,
        })
    }

    async fn find_by_name(&self, name: &AccountName) -> Result<Option<Account>, AccountError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{SELECT_ACCOUNT} WHERE name = $1"))
                .bind(name.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AccountError::Database(e.to_string()))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("{SELECT_ACCOUNT} WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AccountError::Database(e.to_string()))?;

        row.map(Account::try_from).transpose()
    }

    async fn update_password_hash(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), AccountError> {
        let result = sqlx::query("UPDATE account SET password = $2 WHERE id = $1")
            .bind(id.0)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AccountError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn find_api_access(
        &self,
        name: &AccountName,
    ) -> Result<Option<ApiAccess>, AccountError> {
        let row: Option<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT api_key.zone, api_key.api_key, api_key.api_secret
            FROM api_key
            INNER JOIN account ON api_key.tenant = account.tenant
            WHERE account.name = $1
            LIMIT 1
            "#,
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AccountError::Database(e.to_string()))?;

        Ok(row.map(|(zone, key, secret)| ApiAccess { zone, key, secret }))
    }

    async fn insert_api_key(&self, key: &NewApiKey) -> Result<(), AccountError> {
        sqlx::query(
            r#"
            INSERT INTO api_key (zone, api_key, api_secret, tenant)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&key.zone)
        .bind(&key.key)
        .bind(&key.secret)
        .bind(&key.tenant)
        .execute(&self.pool)
        .await
        .map_err(|e| AccountError::Database(e.to_string()))?;

        Ok(())
    }
}
