//! Role directory - the per-user role state machine.
//!
//! States: Unassigned -> user <-> admin. `bind_default` is idempotent;
//! upgrade/downgrade require an existing assignment; no assignment is ever
//! deleted by these operations.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{RoleCode, ROLE_ADMIN, ROLE_USER};

use crate::repository::{InsertOutcome, RoleRepository};

/// Role directory service trait for dependency injection.
#[async_trait]
pub trait RoleDirectoryService: Send + Sync {
    /// Idempotently assign the default role to a user
    async fn bind_default(&self, user_id: Uuid) -> AppResult<()>;

    /// Resolve the role code assigned to a user
    async fn role_code(&self, user_id: Uuid) -> AppResult<RoleCode>;

    /// Move an assigned user to the admin role
    async fn upgrade(&self, user_id: Uuid) -> AppResult<RoleCode>;

    /// Move an assigned user back to the default role
    async fn downgrade(&self, user_id: Uuid) -> AppResult<RoleCode>;
}

/// Concrete implementation of RoleDirectoryService using the repository.
pub struct RoleDirectory {
    repo: Arc<dyn RoleRepository>,
}

impl RoleDirectory {
    /// Create new role directory instance with repository
    pub fn new(repo: Arc<dyn RoleRepository>) -> Self {
        Self { repo }
    }

    /// Resolve a catalog role id by code. The catalog is seeded by migration,
    /// so a miss is a deployment fault, not a business error.
    async fn catalog_role_id(&self, code: &str) -> AppResult<i32> {
        self.repo
            .find_role_by_code(code)
            .await?
            .map(|role| role.id)
            .ok_or_else(|| AppError::internal(format!("role catalog is missing code {code}")))
    }

    /// Set an existing assignment to the given role code.
    async fn set_role(&self, user_id: Uuid, code: &str) -> AppResult<RoleCode> {
        let role_id = self.catalog_role_id(code).await?;

        if !self.repo.update_assignment(user_id, role_id).await? {
            return Err(AppError::NotFound);
        }

        info!(%user_id, role = code, "role assignment updated");
        Ok(RoleCode::from(code))
    }
}

#[async_trait]
impl RoleDirectoryService for RoleDirectory {
    async fn bind_default(&self, user_id: Uuid) -> AppResult<()> {
        // Advisory fast path; the storage constraint is the real guard
        if self.repo.find_assignment(user_id).await?.is_some() {
            info!(%user_id, "user already has a role assignment, skipping bind");
            return Ok(());
        }

        let role_id = self.catalog_role_id(ROLE_USER).await?;

        match self.repo.insert_assignment(user_id, role_id).await? {
            InsertOutcome::Inserted => {
                info!(%user_id, "default role bound");
            }
            InsertOutcome::AlreadyBound => {
                // Lost the race to a concurrent bind; same end state
                info!(%user_id, "concurrent bind detected, already bound");
            }
        }

        Ok(())
    }

    async fn role_code(&self, user_id: Uuid) -> AppResult<RoleCode> {
        let assignment = self
            .repo
            .find_assignment(user_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let role = self
            .repo
            .find_role_by_id(assignment.role_id)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!("role catalog is missing id {}", assignment.role_id))
            })?;

        Ok(role.code)
    }

    async fn upgrade(&self, user_id: Uuid) -> AppResult<RoleCode> {
        self.set_role(user_id, ROLE_ADMIN).await
    }

    async fn downgrade(&self, user_id: Uuid) -> AppResult<RoleCode> {
        self.set_role(user_id, ROLE_USER).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockRoleRepository, Role, RoleAssignment};
    use mockall::predicate::eq;

    const USER_ROLE_ID: i32 = 2;
    const ADMIN_ROLE_ID: i32 = 3;

    fn user_role() -> Role {
        Role {
            id: USER_ROLE_ID,
            code: RoleCode::User,
        }
    }

    fn admin_role() -> Role {
        Role {
            id: ADMIN_ROLE_ID,
            code: RoleCode::Admin,
        }
    }

    #[tokio::test]
    async fn test_bind_default_inserts_assignment() {
        let user_id = Uuid::new_v4();

        let mut repo = MockRoleRepository::new();
        repo.expect_find_assignment()
            .with(eq(user_id))
            .returning(|_| Ok(None));
        repo.expect_find_role_by_code()
            .with(eq(ROLE_USER))
            .returning(|_| Ok(Some(user_role())));
        repo.expect_insert_assignment()
            .with(eq(user_id), eq(USER_ROLE_ID))
            .returning(|_, _| Ok(InsertOutcome::Inserted));

        let directory = RoleDirectory::new(Arc::new(repo));
        assert!(directory.bind_default(user_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_bind_default_is_noop_when_already_assigned() {
        let user_id = Uuid::new_v4();

        let mut repo = MockRoleRepository::new();
        repo.expect_find_assignment().returning(move |_| {
            Ok(Some(RoleAssignment {
                user_id,
                role_id: USER_ROLE_ID,
            }))
        });
        // No insert may happen
        repo.expect_insert_assignment().never();

        let directory = RoleDirectory::new(Arc::new(repo));
        assert!(directory.bind_default(user_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_bind_default_treats_constraint_violation_as_bound() {
        let user_id = Uuid::new_v4();

        let mut repo = MockRoleRepository::new();
        // Advisory check saw nothing, but a concurrent bind wins the insert
        repo.expect_find_assignment().returning(|_| Ok(None));
        repo.expect_find_role_by_code()
            .returning(|_| Ok(Some(user_role())));
        repo.expect_insert_assignment()
            .returning(|_, _| Ok(InsertOutcome::AlreadyBound));

        let directory = RoleDirectory::new(Arc::new(repo));
        assert!(directory.bind_default(user_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_role_code_not_found_without_assignment() {
        let mut repo = MockRoleRepository::new();
        repo.expect_find_assignment().returning(|_| Ok(None));

        let directory = RoleDirectory::new(Arc::new(repo));
        let result = directory.role_code(Uuid::new_v4()).await;

        assert!(matches!(result.unwrap_err(), AppError::NotFound));
    }

    #[tokio::test]
    async fn test_role_code_resolves_through_catalog() {
        let user_id = Uuid::new_v4();

        let mut repo = MockRoleRepository::new();
        repo.expect_find_assignment().returning(move |_| {
            Ok(Some(RoleAssignment {
                user_id,
                role_id: ADMIN_ROLE_ID,
            }))
        });
        repo.expect_find_role_by_id()
            .with(eq(ADMIN_ROLE_ID))
            .returning(|_| Ok(Some(admin_role())));

        let directory = RoleDirectory::new(Arc::new(repo));
        assert_eq!(directory.role_code(user_id).await.unwrap(), RoleCode::Admin);
    }

    #[tokio::test]
    async fn test_upgrade_sets_admin() {
        let user_id = Uuid::new_v4();

        let mut repo = MockRoleRepository::new();
        repo.expect_find_role_by_code()
            .with(eq(ROLE_ADMIN))
            .returning(|_| Ok(Some(admin_role())));
        repo.expect_update_assignment()
            .with(eq(user_id), eq(ADMIN_ROLE_ID))
            .returning(|_, _| Ok(true));

        let directory = RoleDirectory::new(Arc::new(repo));
        assert_eq!(directory.upgrade(user_id).await.unwrap(), RoleCode::Admin);
    }

    #[tokio::test]
    async fn test_downgrade_sets_user() {
        let user_id = Uuid::new_v4();

        let mut repo = MockRoleRepository::new();
        repo.expect_find_role_by_code()
            .with(eq(ROLE_USER))
            .returning(|_| Ok(Some(user_role())));
        repo.expect_update_assignment()
            .with(eq(user_id), eq(USER_ROLE_ID))
            .returning(|_, _| Ok(true));

        let directory = RoleDirectory::new(Arc::new(repo));
        assert_eq!(directory.downgrade(user_id).await.unwrap(), RoleCode::User);
    }

    #[tokio::test]
    async fn test_upgrade_without_assignment_is_not_found() {
        let mut repo = MockRoleRepository::new();
        repo.expect_find_role_by_code()
            .returning(|_| Ok(Some(admin_role())));
        repo.expect_update_assignment().returning(|_, _| Ok(false));

        let directory = RoleDirectory::new(Arc::new(repo));
        let result = directory.upgrade(Uuid::new_v4()).await;

        assert!(matches!(result.unwrap_err(), AppError::NotFound));
    }

    #[tokio::test]
    async fn test_downgrade_without_assignment_is_not_found() {
        let mut repo = MockRoleRepository::new();
        repo.expect_find_role_by_code()
            .returning(|_| Ok(Some(user_role())));
        repo.expect_update_assignment().returning(|_, _| Ok(false));

        let directory = RoleDirectory::new(Arc::new(repo));
        let result = directory.downgrade(Uuid::new_v4()).await;

        assert!(matches!(result.unwrap_err(), AppError::NotFound));
    }
}
