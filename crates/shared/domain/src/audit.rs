//! Audit trail events emitted on sensitive actions.
//!
//! Events are write-once records; after emission they are owned by the
//! external log collector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The sensitive actions that produce an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Register,
    Login,
    Update,
    PasswordReset,
    RoleChange,
}

impl AuditAction {
    /// Wire-format action code
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Register => "REGISTER",
            AuditAction::Login => "LOGIN",
            AuditAction::Update => "UPDATE",
            AuditAction::PasswordReset => "PASSWORD_RESET",
            AuditAction::RoleChange => "ROLE_CHANGE",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit record bound for the external log collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub user_id: Uuid,
    pub action: AuditAction,
    pub ip: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Build an event stamped with the current time.
    pub fn new(
        user_id: Uuid,
        action: AuditAction,
        ip: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            action,
            ip: ip.into(),
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}
