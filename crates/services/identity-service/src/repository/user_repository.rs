//! Identity store: user rows and their lookups.
//!
//! The unique constraints on username, email and phone are the source of
//! truth for conflict detection; application-level existence checks are a
//! fast path only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{UpdateContact, User};

/// User repository trait for dependency injection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by username
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Create a new user row. A unique-constraint violation maps to
    /// `Conflict`.
    async fn create(
        &self,
        username: String,
        password_hash: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> AppResult<User>;

    /// Update only the supplied contact fields and refresh `updated_at`
    async fn update_contact(&self, id: Uuid, changes: UpdateContact) -> AppResult<User>;

    /// Replace the stored password blob
    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> AppResult<()>;

    /// Remove a user row. Used for saga compensation only; identities are
    /// not deleted in normal operation.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Users created before the cutoff, for the reconciliation sweep
    async fn list_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<User>>;
}

/// Concrete implementation of UserRepository over SeaORM.
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn create(
        &self,
        username: String,
        password_hash: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> AppResult<User> {
        let now = Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            password_hash: Set(password_hash),
            email: Set(email),
            phone: Set(phone),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active_model.insert(&self.db).await {
            Ok(model) => Ok(User::from(model)),
            // The constraint, not the advisory pre-check, decides conflicts
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AppError::conflict("User"))
            }
            Err(err) => Err(AppError::from(err)),
        }
    }

    async fn update_contact(&self, id: Uuid, changes: UpdateContact) -> AppResult<User> {
        let existing = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = existing.into();

        if let Some(email) = changes.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        active.updated_at = Set(Utc::now());

        match active.update(&self.db).await {
            Ok(model) => Ok(User::from(model)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AppError::conflict("Email or phone"))
            }
            Err(err) => Err(AppError::from(err)),
        }
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> AppResult<()> {
        let existing = UserEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());

        active.update(&self.db).await.map_err(AppError::from)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    async fn list_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .filter(user::Column::CreatedAt.lt(cutoff))
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(User::from).collect())
    }
}
