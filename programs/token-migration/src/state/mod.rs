pub mod migration_config;
pub mod user_migration;

pub use migration_config::*;
pub use user_migration::*;
