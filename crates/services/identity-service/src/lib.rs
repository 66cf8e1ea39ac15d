//! Identity Service Library
//!
//! This crate owns user identities: registration (a saga spanning the role
//! service), login and session tokens, policy-gated user management, audit
//! emission and the reconciliation sweep. It is deployed independently of
//! the role service.

pub mod audit;
pub mod client;
pub mod config;
pub mod grpc;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tonic::transport::Server;
use tracing::info;

use crate::audit::{AuditEmitter, GrpcAuditSink};
use crate::client::RoleClient;
use crate::config::IdentityServiceConfig;
use crate::grpc::IdentityGrpcService;
use crate::infra::Database;
use crate::repository::UserStore;
use crate::service::{IdentityCore, Reconciler, TokenManager};

/// Run the identity service with configuration from the environment.
pub async fn run(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = IdentityServiceConfig::from_env();
    run_server_with_config(host, port, config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = IdentityServiceConfig::from_env();
    let db = Database::connect_without_migrations(&config.database_url).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
}

/// Run the gRPC server with the given configuration.
async fn run_server_with_config(
    host: &str,
    port: u16,
    config: IdentityServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Database::connect(&config.database_url).await?;
    let users = Arc::new(UserStore::new(db.get_connection()));

    // Remote role directory; lazy so this service comes up regardless
    let roles = Arc::new(RoleClient::connect_lazy(
        &config.role_service.endpoint,
        Duration::from_millis(config.role_service.connect_timeout_ms),
        Duration::from_millis(config.role_service.request_timeout_ms),
    )?);

    // Best-effort audit pipeline
    let sink = Arc::new(GrpcAuditSink::connect_lazy(&config.audit.collector_endpoint)?);
    let audit = AuditEmitter::spawn(sink, config.audit.queue_capacity);

    let tokens = Arc::new(TokenManager::new(
        config.jwt.secret.clone(),
        config.jwt.expiration_hours,
    ));

    let identity = Arc::new(IdentityCore::new(
        users.clone(),
        roles.clone(),
        tokens,
        audit,
    ));

    // Background sweep closing the saga crash window
    let reconciler = Arc::new(Reconciler::new(
        users,
        roles,
        Duration::from_secs(config.reconcile_grace_secs.unsigned_abs()),
    ));
    reconciler.spawn(Duration::from_secs(config.reconcile_interval_secs));

    // Create gRPC service
    let grpc_service = IdentityGrpcService::new(identity);

    // Build address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Identity service listening on {}", addr);

    // Run server
    Server::builder()
        .add_service(proto::IdentityServiceServer::new(grpc_service))
        .serve(addr)
        .await?;

    Ok(())
}
