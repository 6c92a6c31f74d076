use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::domain::account::models::AccountId;
use crate::domain::event::errors::EventError;
use crate::domain::event::models::EventKind;
use crate::domain::event::ports::EventRecorder;

pub struct PostgresEventRecorder {
    pool: PgPool,
}

impl PostgresEventRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRecorder for PostgresEventRecorder {
    async fn record(
        &self,
        account_id: AccountId,
        kind: EventKind,
        detail: Option<(String, String)>,
    ) -> Result<(), EventError> {
        let (info_key, info_val) = match detail {
            Some((key, value)) => (Some(key), Some(value)),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO event_log (account_id, kind, happened, info_key, info_val)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account_id.0)
        .bind(kind.as_str())
        .bind(Utc::now())
        .bind(info_key)
        .bind(info_val)
        .execute(&self.pool)
        .await
        .map_err(|e| EventError(e.to_string()))?;

        Ok(())
    }
}
