//! gRPC protocol buffer definitions.
//!
//! This crate contains the generated gRPC service definitions for:
//! - IdentityService: registration, login, token validation, user management
//! - RoleDirectory: role binding and the upgrade/downgrade state machine
//! - AuditTrail: fire-and-forget operation log collector

/// Identity service definitions.
pub mod identity {
    tonic::include_proto!("identity");
}

/// Role directory definitions.
pub mod role {
    tonic::include_proto!("role");
}

/// Audit trail definitions.
pub mod audit {
    tonic::include_proto!("audit");
}

// Re-export commonly used items
pub use audit::audit_trail_client::AuditTrailClient;
pub use audit::audit_trail_server::{AuditTrail, AuditTrailServer};
pub use identity::identity_service_client::IdentityServiceClient;
pub use identity::identity_service_server::{IdentityService, IdentityServiceServer};
pub use role::role_directory_client::RoleDirectoryClient;
pub use role::role_directory_server::{RoleDirectory, RoleDirectoryServer};
