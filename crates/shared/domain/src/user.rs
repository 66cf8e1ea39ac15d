//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{ROLE_ADMIN, ROLE_SUPER_ADMIN, ROLE_USER};

/// Role codes from the fixed catalog.
///
/// `SuperAdmin` is an operator-granted authority level; no operation in this
/// core ever assigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCode {
    User,
    Admin,
    SuperAdmin,
}

impl RoleCode {
    /// Stable string code as stored in the role catalog
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCode::User => ROLE_USER,
            RoleCode::Admin => ROLE_ADMIN,
            RoleCode::SuperAdmin => ROLE_SUPER_ADMIN,
        }
    }
}

impl From<&str> for RoleCode {
    fn from(s: &str) -> Self {
        match s {
            ROLE_SUPER_ADMIN => RoleCode::SuperAdmin,
            ROLE_ADMIN => RoleCode::Admin,
            // Unknown codes degrade to the lowest privilege
            _ => RoleCode::User,
        }
    }
}

impl From<String> for RoleCode {
    fn from(s: String) -> Self {
        RoleCode::from(s.as_str())
    }
}

impl std::fmt::Display for RoleCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record. The id is assigned here and immutable after.
    pub fn new(
        id: Uuid,
        username: String,
        password_hash: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            username,
            password_hash,
            email,
            phone,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Registration request data transfer object
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    /// Unique username, immutable after creation
    pub username: String,
    /// Plain text password, hashed before storage
    pub password: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Contact update data transfer object. Only supplied fields are mutated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContact {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UpdateContact {
    /// True when at least one field would change
    pub fn has_fields(&self) -> bool {
        self.email.is_some() || self.phone.is_some()
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            phone: user.phone,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
