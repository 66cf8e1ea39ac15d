//! gRPC client for the role service.
//!
//! Every call carries a request timeout: a partitioned or slow role service
//! surfaces as `ServiceUnavailable`, never as an indefinite hang. Mutating
//! calls keep `ServiceUnavailable` distinguishable from business errors so
//! the registration saga can decide to compensate; only the degraded lookup
//! helper substitutes a default.

use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, warn};
use uuid::Uuid;

use common::{AppError, AppResult};
use domain::RoleCode;
use proto::role::{role_directory_client::RoleDirectoryClient as ProtoRoleClient, RoleRequest};

/// Trait for role directory operations needed by the identity service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleDirectoryClient: Send + Sync {
    /// Idempotently bind the default role to a user.
    /// `Err(ServiceUnavailable)` means the directory could not be reached.
    async fn bind_default_role(&self, user_id: Uuid) -> AppResult<()>;

    /// Exact role lookup: `Ok(None)` when the user has no assignment,
    /// `Err(ServiceUnavailable)` when the directory is unreachable.
    async fn find_role(&self, user_id: Uuid) -> AppResult<Option<RoleCode>>;

    /// Move a user to the admin role
    async fn upgrade_to_admin(&self, user_id: Uuid) -> AppResult<RoleCode>;

    /// Move a user back to the default role
    async fn downgrade_to_user(&self, user_id: Uuid) -> AppResult<RoleCode>;
}

/// Degraded-mode lookup: an unreachable directory answers with the lowest
/// privilege code instead of failing the caller. `Ok(None)` (no assignment)
/// passes through untouched.
pub async fn role_code_or_degraded(
    client: &dyn RoleDirectoryClient,
    user_id: Uuid,
) -> AppResult<Option<RoleCode>> {
    match client.find_role(user_id).await {
        Err(err) if err.is_unavailable() => {
            warn!(%user_id, "role service unavailable, degrading lookup to lowest privilege");
            Ok(Some(RoleCode::User))
        }
        other => other,
    }
}

/// gRPC client wrapper for the role service.
pub struct RoleClient {
    client: ProtoRoleClient<Channel>,
    request_timeout: Duration,
}

impl RoleClient {
    /// Build a lazily-connecting client. The identity service must come up
    /// even while the role service is down; calls then fail with
    /// `ServiceUnavailable` until it recovers.
    pub fn connect_lazy(
        endpoint: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, tonic::transport::Error> {
        debug!("Connecting lazily to role-service at {}", endpoint);
        let channel = Endpoint::from_shared(endpoint.to_string())?
            .connect_timeout(connect_timeout)
            .connect_lazy();

        Ok(Self {
            client: ProtoRoleClient::new(channel),
            request_timeout,
        })
    }

    /// Run a directory call under the request timeout, folding timeouts into
    /// `ServiceUnavailable`.
    async fn call<F, T>(&self, fut: F) -> AppResult<T>
    where
        F: std::future::Future<Output = Result<T, tonic::Status>>,
    {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(status)) => Err(AppError::from(status)),
            Err(_) => Err(AppError::service_unavailable("role-service: request timed out")),
        }
    }
}

#[async_trait]
impl RoleDirectoryClient for RoleClient {
    async fn bind_default_role(&self, user_id: Uuid) -> AppResult<()> {
        let mut client = self.client.clone();
        let request = tonic::Request::new(RoleRequest {
            user_id: user_id.to_string(),
        });

        self.call(async move { client.bind_default_role(request).await })
            .await?;
        Ok(())
    }

    async fn find_role(&self, user_id: Uuid) -> AppResult<Option<RoleCode>> {
        let mut client = self.client.clone();
        let request = tonic::Request::new(RoleRequest {
            user_id: user_id.to_string(),
        });

        match self.call(async move { client.get_user_role(request).await }).await {
            Ok(response) => Ok(Some(RoleCode::from(response.into_inner().role.as_str()))),
            Err(AppError::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn upgrade_to_admin(&self, user_id: Uuid) -> AppResult<RoleCode> {
        let mut client = self.client.clone();
        let request = tonic::Request::new(RoleRequest {
            user_id: user_id.to_string(),
        });

        let response = self
            .call(async move { client.upgrade_to_admin(request).await })
            .await?;
        Ok(RoleCode::from(response.into_inner().role.as_str()))
    }

    async fn downgrade_to_user(&self, user_id: Uuid) -> AppResult<RoleCode> {
        let mut client = self.client.clone();
        let request = tonic::Request::new(RoleRequest {
            user_id: user_id.to_string(),
        });

        let response = self
            .call(async move { client.downgrade_to_user(request).await })
            .await?;
        Ok(RoleCode::from(response.into_inner().role.as_str()))
    }
}
