//! Role Service Library
//!
//! This crate owns role assignments and exposes the role directory over gRPC.
//! It is deployed independently of the identity service.

pub mod config;
pub mod grpc;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;
use tracing::info;

use crate::config::RoleServiceConfig;
use crate::grpc::RoleGrpcService;
use crate::infra::Database;
use crate::repository::RoleStore;
use crate::service::RoleDirectory;

/// Run the role service with configuration from the environment.
pub async fn run(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = RoleServiceConfig::from_env();
    run_server_with_config(host, port, config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = RoleServiceConfig::from_env();
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
    config: RoleServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Database::connect(&config.database_url).await?;

    // Create repository and service
    let role_repo = Arc::new(RoleStore::new(db.get_connection()));
    let directory = Arc::new(RoleDirectory::new(role_repo));

    // Create gRPC service
    let grpc_service = RoleGrpcService::new(directory);

    // Build address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Role service listening on {}", addr);

    // Run server
    Server::builder()
        .add_service(proto::RoleDirectoryServer::new(grpc_service))
        .serve(addr)
        .await?;

    Ok(())
}
