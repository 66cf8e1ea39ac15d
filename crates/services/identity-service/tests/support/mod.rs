//! In-memory test doubles shared by the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::{AuditEvent, RoleCode, UpdateContact, User};
use identity_service_lib::audit::{AuditEmitter, AuditSink};
use identity_service_lib::client::RoleDirectoryClient;
use identity_service_lib::repository::UserRepository;
use identity_service_lib::service::{IdentityCore, TokenManager};

/// User store over a mutex-guarded map, enforcing the same uniqueness rules
/// as the real schema.
#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row as-is, bypassing uniqueness checks and timestamps.
    pub fn insert_raw(&self, user: User) {
        self.rows.lock().unwrap().insert(user.id, user);
    }

    pub fn count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn create(
        &self,
        username: String,
        password_hash: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> AppResult<User> {
        let mut rows = self.rows.lock().unwrap();

        let taken = rows.values().any(|u| {
            u.username == username
                || (email.is_some() && u.email == email)
                || (phone.is_some() && u.phone == phone)
        });
        if taken {
            return Err(AppError::conflict("User"));
        }

        let user = User::new(Uuid::new_v4(), username, password_hash, email, phone);
        rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_contact(&self, id: Uuid, changes: UpdateContact) -> AppResult<User> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&id).ok_or(AppError::NotFound)?;

        if let Some(email) = changes.email {
            user.email = Some(email);
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let user = rows.get_mut(&id).ok_or(AppError::NotFound)?;
        user.password_hash = password_hash;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        if self.rows.lock().unwrap().remove(&id).is_none() {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn list_created_before(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.created_at < cutoff)
            .cloned()
            .collect())
    }
}

/// Role directory over a map, with a switch simulating an outage.
#[derive(Default)]
pub struct InMemoryRoles {
    assignments: Mutex<HashMap<Uuid, RoleCode>>,
    unavailable: AtomicBool,
}

impl InMemoryRoles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    pub fn assign(&self, user_id: Uuid, role: RoleCode) {
        self.assignments.lock().unwrap().insert(user_id, role);
    }

    fn check_up(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AppError::service_unavailable("role-service"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RoleDirectoryClient for InMemoryRoles {
    async fn bind_default_role(&self, user_id: Uuid) -> AppResult<()> {
        self.check_up()?;
        self.assignments
            .lock()
            .unwrap()
            .entry(user_id)
            .or_insert(RoleCode::User);
        Ok(())
    }

    async fn find_role(&self, user_id: Uuid) -> AppResult<Option<RoleCode>> {
        self.check_up()?;
        Ok(self.assignments.lock().unwrap().get(&user_id).copied())
    }

    async fn upgrade_to_admin(&self, user_id: Uuid) -> AppResult<RoleCode> {
        self.check_up()?;
        let mut assignments = self.assignments.lock().unwrap();
        let role = assignments.get_mut(&user_id).ok_or(AppError::NotFound)?;
        *role = RoleCode::Admin;
        Ok(*role)
    }

    async fn downgrade_to_user(&self, user_id: Uuid) -> AppResult<RoleCode> {
        self.check_up()?;
        let mut assignments = self.assignments.lock().unwrap();
        let role = assignments.get_mut(&user_id).ok_or(AppError::NotFound)?;
        *role = RoleCode::User;
        Ok(*role)
    }
}

/// Audit sink that records delivered events.
#[derive(Default)]
pub struct CapturingSink {
    pub events: Mutex<Vec<AuditEvent>>,
    pub delivered: tokio::sync::Notify,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for CapturingSink {
    async fn deliver(&self, event: &AuditEvent) -> AppResult<()> {
        self.events.lock().unwrap().push(event.clone());
        self.delivered.notify_one();
        Ok(())
    }
}

pub struct TestHarness {
    pub users: Arc<InMemoryUsers>,
    pub roles: Arc<InMemoryRoles>,
    pub sink: Arc<CapturingSink>,
    pub service: IdentityCore,
}

/// Wire an identity service over the in-memory doubles.
pub fn harness() -> TestHarness {
    let users = Arc::new(InMemoryUsers::new());
    let roles = Arc::new(InMemoryRoles::new());
    let sink = Arc::new(CapturingSink::new());

    let tokens = Arc::new(TokenManager::new(
        "integration-test-secret-0123456789ab".to_string(),
        24,
    ));
    let audit = AuditEmitter::spawn(sink.clone(), 64);

    let service = IdentityCore::new(users.clone(), roles.clone(), tokens, audit);

    TestHarness {
        users,
        roles,
        sink,
        service,
    }
}
