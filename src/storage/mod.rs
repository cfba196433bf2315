mod repository;

pub use repository::*;

/// SQL migration for users, shops and shop transactions
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for person-to-person lending
pub const MIGRATION_002_LENDING: &str = include_str!("migrations/002_lending.sql");
