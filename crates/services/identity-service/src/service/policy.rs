//! Authorization policy: who may act on whom.
//!
//! Self-access is always allowed. Beyond that the decision rests on role
//! directory lookups: super_admin acts on anyone, admin only on plain users.
//! A missing assignment during the check means denial, never an error.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use domain::RoleCode;

use crate::client::{role_code_or_degraded, RoleDirectoryClient};

/// Permission checks over role directory lookups.
#[derive(Clone)]
pub struct AccessPolicy {
    roles: Arc<dyn RoleDirectoryClient>,
}

impl AccessPolicy {
    /// Create new policy instance over a role directory client
    pub fn new(roles: Arc<dyn RoleDirectoryClient>) -> Self {
        Self { roles }
    }

    /// May `actor` act on `target`?
    pub async fn has_permission(&self, actor: Uuid, target: Uuid) -> bool {
        // Everyone may act on themselves
        if actor == target {
            return true;
        }

        let Some(actor_role) = self.resolve(actor).await else {
            return false;
        };

        match actor_role {
            RoleCode::SuperAdmin => true,
            // Admins act on plain users only; this needs a second lookup
            RoleCode::Admin => matches!(self.resolve(target).await, Some(RoleCode::User)),
            RoleCode::User => false,
        }
    }

    /// May `actor` change another user's role? Promotion and demotion are
    /// reserved to super admins.
    pub async fn may_change_role(&self, actor: Uuid) -> bool {
        matches!(self.resolve(actor).await, Some(RoleCode::SuperAdmin))
    }

    /// Resolve a role, treating both lookup failure and a missing
    /// assignment as "no role".
    async fn resolve(&self, user_id: Uuid) -> Option<RoleCode> {
        match role_code_or_degraded(self.roles.as_ref(), user_id).await {
            Ok(role) => role,
            Err(err) => {
                debug!(%user_id, error = %err, "role lookup failed during permission check");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockRoleDirectoryClient;
    use common::AppError;
    use mockall::predicate::eq;

    fn policy_with(client: MockRoleDirectoryClient) -> AccessPolicy {
        AccessPolicy::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_self_access_always_permitted() {
        let mut client = MockRoleDirectoryClient::new();
        // No lookup may happen for self-access
        client.expect_find_role().never();

        let policy = policy_with(client);
        let id = Uuid::new_v4();

        assert!(policy.has_permission(id, id).await);
    }

    #[tokio::test]
    async fn test_super_admin_acts_on_anyone() {
        let actor = Uuid::new_v4();

        let mut client = MockRoleDirectoryClient::new();
        client
            .expect_find_role()
            .with(eq(actor))
            .returning(|_| Ok(Some(RoleCode::SuperAdmin)));

        let policy = policy_with(client);
        assert!(policy.has_permission(actor, Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_admin_acts_on_plain_user() {
        let actor = Uuid::new_v4();
        let target = Uuid::new_v4();

        let mut client = MockRoleDirectoryClient::new();
        client
            .expect_find_role()
            .with(eq(actor))
            .returning(|_| Ok(Some(RoleCode::Admin)));
        client
            .expect_find_role()
            .with(eq(target))
            .returning(|_| Ok(Some(RoleCode::User)));

        let policy = policy_with(client);
        assert!(policy.has_permission(actor, target).await);
    }

    #[tokio::test]
    async fn test_admin_denied_on_admin_target() {
        let actor = Uuid::new_v4();
        let target = Uuid::new_v4();

        let mut client = MockRoleDirectoryClient::new();
        client
            .expect_find_role()
            .with(eq(actor))
            .returning(|_| Ok(Some(RoleCode::Admin)));
        client
            .expect_find_role()
            .with(eq(target))
            .returning(|_| Ok(Some(RoleCode::Admin)));

        let policy = policy_with(client);
        assert!(!policy.has_permission(actor, target).await);
    }

    #[tokio::test]
    async fn test_plain_user_denied_on_others() {
        let actor = Uuid::new_v4();

        let mut client = MockRoleDirectoryClient::new();
        client
            .expect_find_role()
            .returning(|_| Ok(Some(RoleCode::User)));

        let policy = policy_with(client);
        assert!(!policy.has_permission(actor, Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_missing_assignment_is_denial() {
        let mut client = MockRoleDirectoryClient::new();
        client.expect_find_role().returning(|_| Ok(None));

        let policy = policy_with(client);
        assert!(!policy.has_permission(Uuid::new_v4(), Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_unavailable_directory_degrades_to_lowest_privilege() {
        // Actor degrades to plain user, which cannot act on others
        let mut client = MockRoleDirectoryClient::new();
        client
            .expect_find_role()
            .returning(|_| Err(AppError::service_unavailable("role-service")));

        let policy = policy_with(client);
        assert!(!policy.has_permission(Uuid::new_v4(), Uuid::new_v4()).await);
    }

    #[tokio::test]
    async fn test_role_change_reserved_to_super_admin() {
        let super_admin = Uuid::new_v4();
        let admin = Uuid::new_v4();

        let mut client = MockRoleDirectoryClient::new();
        client
            .expect_find_role()
            .with(eq(super_admin))
            .returning(|_| Ok(Some(RoleCode::SuperAdmin)));
        client
            .expect_find_role()
            .with(eq(admin))
            .returning(|_| Ok(Some(RoleCode::Admin)));

        let policy = policy_with(client);
        assert!(policy.may_change_role(super_admin).await);
        assert!(!policy.may_change_role(admin).await);
    }
}
