//! Repository layer for data access.

pub mod entities;
mod role_repository;

pub use role_repository::{InsertOutcome, Role, RoleAssignment, RoleRepository, RoleStore};

#[cfg(test)]
pub use role_repository::MockRoleRepository;
