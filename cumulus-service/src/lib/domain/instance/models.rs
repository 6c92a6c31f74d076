use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::domain::instance::errors::InstanceIdError;

/// Label identifying the account that may control an instance.
///
/// The label is the sole authorization fact; the provider is
/// authoritative for it and nothing about instances is persisted here.
pub const OWNER_LABEL: &str = "owner";

/// Lifecycle state an instance must be in for a bulk shutdown to
/// consider it. Other states (provider-defined, open set) pass through
/// untouched.
pub const STATE_RUNNING: &str = "running";

/// Provider-assigned instance identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    /// Parse an instance ID from its string form.
    ///
    /// # Errors
    /// * `InvalidFormat` - not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, InstanceIdError> {
        Uuid::parse_str(s)
            .map(InstanceId)
            .map_err(|e| InstanceIdError::InvalidFormat(e.to_string()))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A cloud compute instance as reported by the provider.
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: InstanceId,
    pub name: String,
    pub labels: HashMap<String, String>,
    pub ip: Option<String>,
    pub state: String,
}

impl Instance {
    /// The single named ownership check: true iff the instance carries
    /// an `owner` label equal to the subject. A missing label means
    /// nobody may control the instance through this service.
    pub fn is_owned_by(&self, subject: &str) -> bool {
        self.labels
            .get(OWNER_LABEL)
            .is_some_and(|owner| owner == subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance_with_labels(labels: HashMap<String, String>) -> Instance {
        Instance {
            id: InstanceId(Uuid::new_v4()),
            name: "worker-1".to_string(),
            labels,
            ip: Some("203.0.113.7".to_string()),
            state: STATE_RUNNING.to_string(),
        }
    }

    #[test]
    fn test_is_owned_by_matching_label() {
        let instance =
            instance_with_labels(HashMap::from([("owner".to_string(), "alice".to_string())]));

        assert!(instance.is_owned_by("alice"));
        assert!(!instance.is_owned_by("bob"));
    }

    #[test]
    fn test_missing_owner_label_owns_nobody() {
        let instance =
            instance_with_labels(HashMap::from([("course".to_string(), "m346".to_string())]));

        assert!(!instance.is_owned_by("alice"));
    }

    #[test]
    fn test_instance_id_parsing() {
        assert!(InstanceId::from_string("8f9f54a9-5d2c-4a61-a064-a46f73371c29").is_ok());
        assert!(InstanceId::from_string("not-a-uuid").is_err());
    }
}
