//! Infrastructure layer - database access.

mod db;
pub mod migrations;

pub use db::Database;
pub use migrations::Migrator;
