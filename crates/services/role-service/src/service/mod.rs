//! Business logic layer.

mod role_directory;

pub use role_directory::{RoleDirectory, RoleDirectoryService};
