//! Database entities for the role directory.

pub mod role;
pub mod user_role;
