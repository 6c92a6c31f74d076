use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::account::errors::AccountError;
use crate::domain::account::models::Account;
use crate::domain::account::models::AccountName;
use crate::domain::account::models::ApiAccess;
use crate::domain::account::ports::AccountRepository;
use crate::domain::event::models::EventKind;
use crate::domain::event::ports::EventRecorder;
use crate::domain::instance::errors::InstanceError;
use crate::domain::instance::models::Instance;
use crate::domain::instance::models::InstanceId;
use crate::domain::instance::models::STATE_RUNNING;
use crate::domain::instance::ports::CloudProvider;
use crate::domain::instance::ports::InstanceServicePort;

/// Domain service gating instance operations behind the ownership check.
///
/// Authentication happened upstream (the subject comes out of a
/// validated token); this service resolves the subject's per-tenant
/// provider credentials and decides ownership per instance.
pub struct InstanceService<AR, CP, EV>
where
    AR: AccountRepository,
    CP: CloudProvider,
    EV: EventRecorder,
{
    accounts: Arc<AR>,
    provider: Arc<CP>,
    events: Arc<EV>,
}

impl<AR, CP, EV> InstanceService<AR, CP, EV>
where
    AR: AccountRepository,
    CP: CloudProvider,
    EV: EventRecorder,
{
    pub fn new(accounts: Arc<AR>, provider: Arc<CP>, events: Arc<EV>) -> Self {
        Self {
            accounts,
            provider,
            events,
        }
    }

    /// Stop every running instance visible to the subject's credentials,
    /// optionally narrowed to instances carrying a given label value.
    /// Per-instance failures are reported and skipped; the sweep
    /// continues. Used by operator tooling.
    ///
    /// # Errors
    /// * `Unauthorized` - no credentials resolve for the subject
    /// * `Provider` | `Database` - listing failed
    pub async fn stop_matching(
        &self,
        subject: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<InstanceId>, InstanceError> {
        let (account, access) = self.credentials_for(subject).await?;
        let instances = self.provider.list_instances(&access).await?;

        let mut stopped = Vec::new();
        for instance in instances {
            if instance.state != STATE_RUNNING {
                continue;
            }
            if let Some((key, value)) = filter {
                if instance.labels.get(key).map(String::as_str) != Some(value) {
                    continue;
                }
            }
            match self.provider.stop_instance(&access, &instance.id).await {
                Ok(()) => {
                    self.record_instance_event(&account, EventKind::InstanceStop, &instance.id)
                        .await;
                    stopped.push(instance.id);
                }
                Err(e) => {
                    tracing::warn!(id = %instance.id, error = %e, "Failed to stop instance, continuing");
                }
            }
        }
        Ok(stopped)
    }

    async fn credentials_for(
        &self,
        subject: &str,
    ) -> Result<(Account, ApiAccess), InstanceError> {
        let name = AccountName::new(subject.to_string()).map_err(|e| {
            tracing::warn!(subject, error = %e, "Token subject is not a valid account name");
            InstanceError::Unauthorized
        })?;

        let account = self
            .accounts
            .find_by_name(&name)
            .await
            .map_err(account_lookup_error)?
            .ok_or_else(|| {
                tracing::warn!(subject, "Token subject has no account");
                InstanceError::Unauthorized
            })?;

        let access = self
            .accounts
            .find_api_access(&name)
            .await
            .map_err(account_lookup_error)?
            .ok_or_else(|| {
                tracing::warn!(subject, "No API credentials for the account's tenant");
                InstanceError::Unauthorized
            })?;

        Ok((account, access))
    }

    /// Fetch an instance and require the subject to own it. Absence and
    /// foreign ownership are the same failure by design.
    async fn owned_instance(
        &self,
        access: &ApiAccess,
        subject: &str,
        id: &InstanceId,
    ) -> Result<Instance, InstanceError> {
        let Some(instance) = self.provider.get_instance(access, id).await? else {
            tracing::warn!(%id, subject, "Instance lookup for unknown instance");
            return Err(InstanceError::Unauthorized);
        };

        if !instance.is_owned_by(subject) {
            tracing::warn!(%id, subject, "Subject does not own the instance");
            return Err(InstanceError::Unauthorized);
        }

        Ok(instance)
    }

    async fn record_instance_event(&self, account: &Account, kind: EventKind, id: &InstanceId) {
        if let Err(e) = self
            .events
            .record(
                account.id,
                kind,
                Some(("instance".to_string(), id.to_string())),
            )
            .await
        {
            tracing::error!(account_id = %account.id, %kind, error = %e, "Failed to record audit event");
        }
    }
}

fn account_lookup_error(e: AccountError) -> InstanceError {
    InstanceError::Database(e.to_string())
}

#[async_trait]
impl<AR, CP, EV> InstanceServicePort for InstanceService<AR, CP, EV>
where
    AR: AccountRepository,
    CP: CloudProvider,
    EV: EventRecorder,
{
    async fn list_owned(&self, subject: &str) -> Result<Vec<Instance>, InstanceError> {
        let (_, access) = self.credentials_for(subject).await?;
        let instances = self.provider.list_instances(&access).await?;

        Ok(instances
            .into_iter()
            .filter(|instance| instance.is_owned_by(subject))
            .collect())
    }

    async fn state(&self, subject: &str, id: &InstanceId) -> Result<String, InstanceError> {
        let (_, access) = self.credentials_for(subject).await?;
        let instance = self.owned_instance(&access, subject, id).await?;
        Ok(instance.state)
    }

    async fn start(&self, subject: &str, id: &InstanceId) -> Result<(), InstanceError> {
        let (account, access) = self.credentials_for(subject).await?;
        self.owned_instance(&access, subject, id).await?;

        self.provider.start_instance(&access, id).await?;
        tracing::info!(subject, %id, "Instance started");

        self.record_instance_event(&account, EventKind::InstanceStart, id)
            .await;
        Ok(())
    }

    async fn stop(&self, subject: &str, id: &InstanceId) -> Result<(), InstanceError> {
        let (account, access) = self.credentials_for(subject).await?;
        self.owned_instance(&access, subject, id).await?;

        self.provider.stop_instance(&access, id).await?;
        tracing::info!(subject, %id, "Instance stopped");

        self.record_instance_event(&account, EventKind::InstanceStop, id)
            .await;
        Ok(())
    }
}
