//! gRPC clients for remote dependencies.

mod role_client;

pub use role_client::{role_code_or_degraded, RoleClient, RoleDirectoryClient};

#[cfg(test)]
pub use role_client::MockRoleDirectoryClient;
