use std::fmt;

/// Audit event kinds appended to the event log.
///
/// The log is write-only from the service's point of view: flows record
/// events as a side effect and never read them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    AccountCreated,
    AccountDeleted,
    LoginSuccess,
    LoginFailure,
    InstanceStart,
    InstanceStop,
    PasswordRequested,
    PasswordReset,
}

impl EventKind {
    /// The stable string form stored in the event log.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AccountCreated => "account_created",
            EventKind::AccountDeleted => "account_deleted",
            EventKind::LoginSuccess => "login_success",
            EventKind::LoginFailure => "login_failure",
            EventKind::InstanceStart => "instance_start",
            EventKind::InstanceStop => "instance_stop",
            EventKind::PasswordRequested => "password_requested",
            EventKind::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_string_form() {
        assert_eq!(EventKind::LoginFailure.as_str(), "login_failure");
        assert_eq!(EventKind::PasswordReset.to_string(), "password_reset");
    }
}
