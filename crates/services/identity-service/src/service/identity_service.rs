//! Identity orchestration: registration saga, login, account maintenance.
//!
//! Registration spans two services without a distributed transaction. The
//! user row is the first leg; the remote default-role bind is the second.
//! A failed bind compensates by hard-deleting the row, so no caller ever
//! observes a half-registered identity. The crash window between the legs
//! is closed by the reconciler, not here.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use common::{AppError, AppResult, OptionExt};
use domain::{
    AuditAction, AuditEvent, Password, RegisterUser, RoleCode, UpdateContact, UserResponse,
    MAX_USERNAME_LENGTH,
};

use crate::audit::AuditEmitter;
use crate::client::RoleDirectoryClient;
use crate::repository::UserRepository;
use crate::service::policy::AccessPolicy;
use crate::service::token::{Claims, TokenManager, TokenResponse};

/// Verification target for unknown usernames. base64 of 48 zero bytes, so it
/// decodes to a well-formed salt-and-digest blob that matches no password.
/// Keeps the hashing work on the login path independent of whether the
/// username exists.
const DUMMY_PASSWORD_BLOB: &str =
    "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Identity service trait for dependency injection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Register a new identity and bind its default role
    async fn register(&self, request: RegisterUser, client_ip: &str) -> AppResult<UserResponse>;

    /// Authenticate and issue a session token
    async fn login(&self, username: &str, password: &str, client_ip: &str)
        -> AppResult<TokenResponse>;

    /// Validate a session token and return its claims
    fn validate_token(&self, token: &str) -> AppResult<Claims>;

    /// Fetch a user, subject to the access policy
    async fn get_user(&self, actor: Uuid, id: Uuid) -> AppResult<UserResponse>;

    /// Update contact fields, subject to the access policy
    async fn update_user(
        &self,
        actor: Uuid,
        id: Uuid,
        changes: UpdateContact,
        client_ip: &str,
    ) -> AppResult<UserResponse>;

    /// Replace a user's password, subject to the access policy
    async fn reset_password(
        &self,
        actor: Uuid,
        id: Uuid,
        new_password: &str,
        client_ip: &str,
    ) -> AppResult<()>;

    /// Move a user to the admin role. Super admins only.
    async fn promote(&self, actor: Uuid, id: Uuid, client_ip: &str) -> AppResult<RoleCode>;

    /// Move a user back to the default role. Super admins only.
    async fn demote(&self, actor: Uuid, id: Uuid, client_ip: &str) -> AppResult<RoleCode>;
}

/// Concrete identity service implementation.
pub struct IdentityCore {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleDirectoryClient>,
    policy: AccessPolicy,
    tokens: Arc<TokenManager>,
    audit: AuditEmitter,
}

impl IdentityCore {
    /// Create new identity service instance
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleDirectoryClient>,
        tokens: Arc<TokenManager>,
        audit: AuditEmitter,
    ) -> Self {
        let policy = AccessPolicy::new(roles.clone());
        Self {
            users,
            roles,
            policy,
            tokens,
            audit,
        }
    }

    fn validate_username(username: &str) -> AppResult<()> {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("Username must not be empty"));
        }
        if trimmed.len() != username.len() {
            return Err(AppError::validation(
                "Username must not have leading or trailing whitespace",
            ));
        }
        if username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(AppError::validation(format!(
                "Username must be at most {} characters",
                MAX_USERNAME_LENGTH
            )));
        }
        Ok(())
    }

    async fn require_permission(&self, actor: Uuid, target: Uuid) -> AppResult<()> {
        if self.policy.has_permission(actor, target).await {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    fn emit_audit(&self, user_id: Uuid, action: AuditAction, ip: &str, detail: impl Into<String>) {
        self.audit
            .emit(AuditEvent::new(user_id, action, ip, detail));
    }
}

#[async_trait]
impl IdentityService for IdentityCore {
    async fn register(&self, request: RegisterUser, client_ip: &str) -> AppResult<UserResponse> {
        // Validation first; no side effects on bad input
        Self::validate_username(&request.username)?;
        let password = Password::new(&request.password)?;

        // Advisory pre-checks; the unique constraints remain the authority
        if self
            .users
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Username"));
        }
        if let Some(email) = &request.email {
            if self.users.find_by_email(email).await?.is_some() {
                return Err(AppError::conflict("Email"));
            }
        }

        // First leg: durable user row
        let user = self
            .users
            .create(
                request.username,
                password.into_string(),
                request.email,
                request.phone,
            )
            .await?;

        // Second leg: remote default-role bind
        if let Err(bind_err) = self.roles.bind_default_role(user.id).await {
            warn!(
                user_id = %user.id,
                error = %bind_err,
                "default role bind failed, compensating registration"
            );
            // Compensation. A row already gone (reconciler, crash replay) is
            // acceptable; any other delete failure is surfaced over the bind
            // error since it leaves an orphan.
            match self.users.delete(user.id).await {
                Ok(()) | Err(AppError::NotFound) => {}
                Err(delete_err) => {
                    warn!(user_id = %user.id, error = %delete_err, "registration compensation failed");
                    return Err(delete_err);
                }
            }
            return Err(bind_err);
        }

        info!(user_id = %user.id, username = %user.username, "user registered");
        self.emit_audit(user.id, AuditAction::Register, client_ip, "registered");

        Ok(UserResponse::from(user))
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
        client_ip: &str,
    ) -> AppResult<TokenResponse> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::validation("Username and password are required"));
        }

        let user = self.users.find_by_username(username).await?;

        // Hash regardless of whether the username exists, so the two
        // rejections are indistinguishable by timing
        let verified = match &user {
            Some(user) => Password::from_encoded(&user.password_hash).verify(password),
            None => {
                Password::from_encoded(DUMMY_PASSWORD_BLOB).verify(password);
                false
            }
        };

        let user = match (user, verified) {
            (Some(user), true) => user,
            _ => return Err(AppError::InvalidCredentials),
        };

        let token = self.tokens.issue(user.id, &user.username)?;

        info!(user_id = %user.id, "user logged in");
        self.emit_audit(user.id, AuditAction::Login, client_ip, "logged in");

        Ok(token)
    }

    fn validate_token(&self, token: &str) -> AppResult<Claims> {
        Ok(self.tokens.validate(token)?)
    }

    async fn get_user(&self, actor: Uuid, id: Uuid) -> AppResult<UserResponse> {
        self.require_permission(actor, id).await?;

        let user = self.users.find_by_id(id).await?.ok_or_not_found()?;
        Ok(UserResponse::from(user))
    }

    async fn update_user(
        &self,
        actor: Uuid,
        id: Uuid,
        changes: UpdateContact,
        client_ip: &str,
    ) -> AppResult<UserResponse> {
        self.require_permission(actor, id).await?;

        if !changes.has_fields() {
            return Err(AppError::validation("No fields to update"));
        }

        // Advisory check; the unique constraint still decides
        if let Some(email) = &changes.email {
            if let Some(existing) = self.users.find_by_email(email).await? {
                if existing.id != id {
                    return Err(AppError::conflict("Email"));
                }
            }
        }

        let mut changed = Vec::new();
        if changes.email.is_some() {
            changed.push("email");
        }
        if changes.phone.is_some() {
            changed.push("phone");
        }

        let user = self.users.update_contact(id, changes).await?;

        info!(user_id = %id, fields = changed.join(","), "user updated");
        self.emit_audit(
            id,
            AuditAction::Update,
            client_ip,
            format!("updated: {}", changed.join(",")),
        );

        Ok(UserResponse::from(user))
    }

    async fn reset_password(
        &self,
        actor: Uuid,
        id: Uuid,
        new_password: &str,
        client_ip: &str,
    ) -> AppResult<()> {
        self.require_permission(actor, id).await?;

        let password = Password::new(new_password)?;

        // NotFound surfaces from the store if the target is gone
        self.users
            .set_password_hash(id, password.into_string())
            .await?;

        info!(user_id = %id, "password reset");
        self.emit_audit(id, AuditAction::PasswordReset, client_ip, "password reset");

        Ok(())
    }

    async fn promote(&self, actor: Uuid, id: Uuid, client_ip: &str) -> AppResult<RoleCode> {
        if !self.policy.may_change_role(actor).await {
            return Err(AppError::Forbidden);
        }
        self.users.find_by_id(id).await?.ok_or_not_found()?;

        let role = self.roles.upgrade_to_admin(id).await?;

        info!(user_id = %id, role = %role, "user promoted");
        self.emit_audit(
            id,
            AuditAction::RoleChange,
            client_ip,
            format!("role changed to {}", role),
        );

        Ok(role)
    }

    async fn demote(&self, actor: Uuid, id: Uuid, client_ip: &str) -> AppResult<RoleCode> {
        if !self.policy.may_change_role(actor).await {
            return Err(AppError::Forbidden);
        }
        self.users.find_by_id(id).await?.ok_or_not_found()?;

        let role = self.roles.downgrade_to_user(id).await?;

        info!(user_id = %id, role = %role, "user demoted");
        self.emit_audit(
            id,
            AuditAction::RoleChange,
            client_ip,
            format!("role changed to {}", role),
        );

        Ok(role)
    }
}
