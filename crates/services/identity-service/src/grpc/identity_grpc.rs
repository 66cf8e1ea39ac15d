//! gRPC implementation for the IdentityService surface.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use uuid::Uuid;

use domain::{RegisterUser, UpdateContact, UserResponse};
use proto::identity::{
    identity_service_server::IdentityService as IdentityServiceProto, ChangeRoleReply,
    ChangeRoleRequest, GetUserRequest, LoginRequest, RegisterRequest, ResetPasswordReply,
    ResetPasswordRequest, TokenReply, UpdateUserRequest, UserReply, ValidateTokenReply,
    ValidateTokenRequest,
};

use crate::service::IdentityService;

/// gRPC service wrapper for IdentityService.
pub struct IdentityGrpcService {
    service: Arc<dyn IdentityService>,
}

impl IdentityGrpcService {
    /// Create a new gRPC service wrapper.
    pub fn new(service: Arc<dyn IdentityService>) -> Self {
        Self { service }
    }
}

#[tonic::async_trait]
impl IdentityServiceProto for IdentityGrpcService {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<UserReply>, Status> {
        let req = request.into_inner();
        let register = RegisterUser {
            username: req.username,
            password: req.password,
            email: req.email,
            phone: req.phone,
        };

        let user = self
            .service
            .register(register, &req.client_ip)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(user_reply(user)))
    }

    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<TokenReply>, Status> {
        let req = request.into_inner();

        let token = self
            .service
            .login(&req.username, &req.password, &req.client_ip)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(TokenReply {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
        }))
    }

    async fn validate_token(
        &self,
        request: Request<ValidateTokenRequest>,
    ) -> Result<Response<ValidateTokenReply>, Status> {
        let claims = self
            .service
            .validate_token(&request.into_inner().token)
            .map_err(Status::from)?;

        Ok(Response::new(ValidateTokenReply {
            user_id: claims.sub.to_string(),
            username: claims.username,
            issued_at: claims.iat,
            expires_at: claims.exp,
        }))
    }

    async fn get_user(
        &self,
        request: Request<GetUserRequest>,
    ) -> Result<Response<UserReply>, Status> {
        let req = request.into_inner();
        let actor = parse_uuid(&req.actor_id)?;
        let id = parse_uuid(&req.id)?;

        let user = self.service.get_user(actor, id).await.map_err(Status::from)?;

        Ok(Response::new(user_reply(user)))
    }

    async fn update_user(
        &self,
        request: Request<UpdateUserRequest>,
    ) -> Result<Response<UserReply>, Status> {
        let req = request.into_inner();
        let actor = parse_uuid(&req.actor_id)?;
        let id = parse_uuid(&req.id)?;
        let changes = UpdateContact {
            email: req.email,
            phone: req.phone,
        };

        let user = self
            .service
            .update_user(actor, id, changes, &req.client_ip)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(user_reply(user)))
    }

    async fn reset_password(
        &self,
        request: Request<ResetPasswordRequest>,
    ) -> Result<Response<ResetPasswordReply>, Status> {
        let req = request.into_inner();
        let actor = parse_uuid(&req.actor_id)?;
        let id = parse_uuid(&req.id)?;

        self.service
            .reset_password(actor, id, &req.new_password, &req.client_ip)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(ResetPasswordReply {}))
    }

    async fn promote_user(
        &self,
        request: Request<ChangeRoleRequest>,
    ) -> Result<Response<ChangeRoleReply>, Status> {
        let req = request.into_inner();
        let actor = parse_uuid(&req.actor_id)?;
        let id = parse_uuid(&req.id)?;

        let role = self
            .service
            .promote(actor, id, &req.client_ip)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(ChangeRoleReply {
            role: role.to_string(),
        }))
    }

    async fn demote_user(
        &self,
        request: Request<ChangeRoleRequest>,
    ) -> Result<Response<ChangeRoleReply>, Status> {
        let req = request.into_inner();
        let actor = parse_uuid(&req.actor_id)?;
        let id = parse_uuid(&req.id)?;

        let role = self
            .service
            .demote(actor, id, &req.client_ip)
            .await
            .map_err(Status::from)?;

        Ok(Response::new(ChangeRoleReply {
            role: role.to_string(),
        }))
    }
}

fn user_reply(user: UserResponse) -> UserReply {
    UserReply {
        id: user.id.to_string(),
        username: user.username,
        email: user.email,
        phone: user.phone,
        created_at: user.created_at.to_rfc3339(),
        updated_at: user.updated_at.to_rfc3339(),
    }
}

/// Parse a UUID from a proto string field.
fn parse_uuid(s: &str) -> Result<Uuid, Status> {
    s.parse()
        .map_err(|_| Status::invalid_argument("Invalid UUID format"))
}
