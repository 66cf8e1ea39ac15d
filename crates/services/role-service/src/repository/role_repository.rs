//! Role repository: catalog lookups and assignment storage.
//!
//! The primary key on `user_roles.user_id` is the actual race guard for
//! concurrent binds; the application-level existence check is advisory only.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr};
use uuid::Uuid;

use super::entities::{role, user_role};
use common::{AppError, AppResult};
use domain::RoleCode;

/// A row from the fixed role catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Role {
    pub id: i32,
    pub code: RoleCode,
}

impl From<role::Model> for Role {
    fn from(model: role::Model) -> Self {
        Role {
            id: model.id,
            code: RoleCode::from(model.code.as_str()),
        }
    }
}

/// A user's single role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleAssignment {
    pub user_id: Uuid,
    pub role_id: i32,
}

impl From<user_role::Model> for RoleAssignment {
    fn from(model: user_role::Model) -> Self {
        RoleAssignment {
            user_id: model.user_id,
            role_id: model.role_id,
        }
    }
}

/// Outcome of an assignment insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A fresh assignment row was written
    Inserted,
    /// The uniqueness constraint fired: someone else bound first
    AlreadyBound,
}

/// Role repository trait for dependency injection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Look up a catalog role by its code
    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>>;

    /// Look up a catalog role by its id
    async fn find_role_by_id(&self, id: i32) -> AppResult<Option<Role>>;

    /// Find the assignment for a user, if any
    async fn find_assignment(&self, user_id: Uuid) -> AppResult<Option<RoleAssignment>>;

    /// Insert an assignment; a unique-constraint violation reports
    /// `AlreadyBound` instead of an error
    async fn insert_assignment(&self, user_id: Uuid, role_id: i32) -> AppResult<InsertOutcome>;

    /// Move an existing assignment to a different role. Returns false when no
    /// assignment exists for the user.
    async fn update_assignment(&self, user_id: Uuid, role_id: i32) -> AppResult<bool>;
}

/// Concrete implementation of RoleRepository over SeaORM.
pub struct RoleStore {
    db: DatabaseConnection,
}

impl RoleStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleRepository for RoleStore {
    async fn find_role_by_code(&self, code: &str) -> AppResult<Option<Role>> {
        let result = role::Entity::find()
            .filter(role::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Role::from))
    }

    async fn find_role_by_id(&self, id: i32) -> AppResult<Option<Role>> {
        let result = role::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Role::from))
    }

    async fn find_assignment(&self, user_id: Uuid) -> AppResult<Option<RoleAssignment>> {
        let result = user_role::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(RoleAssignment::from))
    }

    async fn insert_assignment(&self, user_id: Uuid, role_id: i32) -> AppResult<InsertOutcome> {
        let active_model = user_role::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role_id),
        };

        match active_model.insert(&self.db).await {
            Ok(_) => Ok(InsertOutcome::Inserted),
            // The constraint is the source of truth for "already bound"
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(InsertOutcome::AlreadyBound)
            }
            Err(err) => Err(AppError::from(err)),
        }
    }

    async fn update_assignment(&self, user_id: Uuid, role_id: i32) -> AppResult<bool> {
        let existing = user_role::Entity::find_by_id(user_id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        let Some(model) = existing else {
            return Ok(false);
        };

        let mut active: user_role::ActiveModel = model.into();
        active.role_id = Set(role_id);
        active.update(&self.db).await.map_err(AppError::from)?;

        Ok(true)
    }
}
