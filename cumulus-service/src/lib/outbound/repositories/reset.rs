use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::account::models::AccountId;
use crate::domain::reset::errors::ResetError;
use crate::domain::reset::models::ResetRecord;
use crate::domain::reset::ports::ResetRepository;

pub struct PostgresResetRepository {
    pool: PgPool,
}

impl PostgresResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ResetRow {
    account_id: i64,
    token: String,
    created: DateTime<Utc>,
    expires: DateTime<Utc>,
}

impl From<ResetRow> for ResetRecord {
    fn from(row: ResetRow) -> Self {
        ResetRecord {
            account_id: AccountId(row.account_id),
            token_hash: row.token,
            created: row.created,
            expires: row.expires,
        }
    }
}

#[async_trait]
impl ResetRepository for PostgresResetRepository {
    async fn find_for_account(
        &self,
        account_id: AccountId,
    ) -> Result<Option<ResetRecord>, ResetError> {
        let row: Option<ResetRow> = sqlx::query_as(
            r#"
            SELECT account_id, token, created, expires
            FROM password_reset
            WHERE account_id = $1
            "#,
        )
        .bind(account_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ResetError::Database(e.to_string()))?;

        Ok(row.map(ResetRecord::from))
    }

    async fn upsert(&self, record: &ResetRecord) -> Result<(), ResetError> {
        // Single statement against the unique constraint: two concurrent
        // requests cannot leave two live records behind.
        sqlx::query(
            r#"
            INSERT INTO password_reset (account_id, token, created, expires)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (account_id) DO UPDATE
            SET token = excluded.token,
                created = excluded.created,
                expires = excluded.expires
            "#,
        )
        .bind(record.account_id.0)
        .bind(&record.token_hash)
        .bind(record.created)
        .bind(record.expires)
        .execute(&self.pool)
        .await
        .map_err(|e| ResetError::Database(e.to_string()))?;

        Ok(())
    }

    async fn redeem(
        &self,
        account_id: AccountId,
        new_password_hash: &str,
    ) -> Result<(), ResetError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ResetError::Database(e.to_string()))?;

        sqlx::query("UPDATE account SET password = $2 WHERE id = $1")
            .bind(account_id.0)
            .bind(new_password_hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| ResetError::Database(e.to_string()))?;

        let deleted = sqlx::query("DELETE FROM password_reset WHERE account_id = $1")
            .bind(account_id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| ResetError::Database(e.to_string()))?;

        // A vanished record means a concurrent confirm won; roll the
        // password update back so the token stays single-use.
        if deleted.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| ResetError::Database(e.to_string()))?;
            return Err(ResetError::AlreadyConsumed);
        }

        tx.commit()
            .await
            .map_err(|e| ResetError::Database(e.to_string()))?;

        Ok(())
    }
}
