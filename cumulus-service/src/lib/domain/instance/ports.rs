use async_trait::async_trait;

use crate::domain::account::models::ApiAccess;
use crate::domain::instance::errors::InstanceError;
use crate::domain::instance::errors::ProviderError;
use crate::domain::instance::models::Instance;
use crate::domain::instance::models::InstanceId;

/// Port for the instance operations exposed over HTTP. Every operation
/// takes the authenticated subject and enforces ownership itself.
#[async_trait]
pub trait InstanceServicePort: Send + Sync + 'static {
    /// List the instances owned by the subject.
    ///
    /// # Errors
    /// * `Unauthorized` - no API credentials resolve for the subject
    /// * `Provider` | `Database` - infrastructure failure
    async fn list_owned(&self, subject: &str) -> Result<Vec<Instance>, InstanceError>;

    /// Report the lifecycle state of one owned instance.
    ///
    /// # Errors
    /// * `Unauthorized` - the instance does not exist, carries no owner
    ///   label, or belongs to someone else
    /// * `Provider` | `Database` - infrastructure failure
    async fn state(&self, subject: &str, id: &InstanceId) -> Result<String, InstanceError>;

    /// Start one owned instance.
    ///
    /// # Errors
    /// * `Unauthorized` - see [`InstanceServicePort::state`]
    /// * `Provider` | `Database` - infrastructure failure
    async fn start(&self, subject: &str, id: &InstanceId) -> Result<(), InstanceError>;

    /// Stop one owned instance.
    ///
    /// # Errors
    /// * `Unauthorized` - see [`InstanceServicePort::state`]
    /// * `Provider` | `Database` - infrastructure failure
    async fn stop(&self, subject: &str, id: &InstanceId) -> Result<(), InstanceError>;
}

/// Capability contract against the external cloud-provider API. Calls
/// are per-request, synchronous, single-attempt, and use the per-tenant
/// credentials passed in.
#[async_trait]
pub trait CloudProvider: Send + Sync + 'static {
    /// List all instances visible to the credentials.
    async fn list_instances(&self, access: &ApiAccess) -> Result<Vec<Instance>, ProviderError>;

    /// Fetch one instance; `None` when the provider reports it absent.
    async fn get_instance(
        &self,
        access: &ApiAccess,
        id: &InstanceId,
    ) -> Result<Option<Instance>, ProviderError>;

    /// Start an instance.
    async fn start_instance(&self, access: &ApiAccess, id: &InstanceId)
        -> Result<(), ProviderError>;

    /// Stop an instance.
    async fn stop_instance(&self, access: &ApiAccess, id: &InstanceId)
        -> Result<(), ProviderError>;
}
