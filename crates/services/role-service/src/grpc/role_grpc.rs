//! gRPC implementation for the RoleDirectory service.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use uuid::Uuid;

use crate::service::RoleDirectoryService;
use proto::role::{
    role_directory_server::RoleDirectory as RoleDirectoryProto, BindReply, RoleReply, RoleRequest,
};

/// gRPC service wrapper for RoleDirectoryService.
pub struct RoleGrpcService {
    service: Arc<dyn RoleDirectoryService>,
}

impl RoleGrpcService {
    /// Create a new gRPC service wrapper.
    pub fn new(service: Arc<dyn RoleDirectoryService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl RoleDirectoryProto for RoleGrpcService {
    async fn bind_default_role(
        &self,
        request: Request<RoleRequest>,
    ) -> Result<Response<BindReply>, Status> {
        let user_id = parse_uuid(&request.into_inner().user_id)?;

        self.service
            .bind_default(user_id)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(BindReply {}))
    }

    async fn get_user_role(
        &self,
        request: Request<RoleRequest>,
    ) -> Result<Response<RoleReply>, Status> {
        let user_id = parse_uuid(&request.into_inner().user_id)?;

        let code = self.service.role_code(user_id).await.map_err(Status::from)?;

        Ok(Response::new(RoleReply {
            role: code.to_string(),
        }))
    }

    async fn upgrade_to_admin(
        &self,
        request: Request<RoleRequest>,
    ) -> Result<Response<RoleReply>, Status> {
        let user_id = parse_uuid(&request.into_inner().user_id)?;

        let code = self.service.upgrade(user_id).await.map_err(Status::from)?;

        Ok(Response::new(RoleReply {
            role: code.to_string(),
        }))
    }

    async fn downgrade_to_user(
        &self,
        request: Request<RoleRequest>,
    ) -> Result<Response<RoleReply>, Status> {
        let user_id = parse_uuid(&request.into_inner().user_id)?;

        let code = self.service.downgrade(user_id).await.map_err(Status::from)?;

        Ok(Response::new(RoleReply {
            role: code.to_string(),
        }))
    }
}

/// Parse a UUID from a proto string field.
fn parse_uuid(s: &str) -> Result<Uuid, Status> {
    s.parse()
        .map_err(|_| Status::invalid_argument("Invalid UUID format"))
}
