// Curator Infrastructure - SQLite Adapter
// Implements: ProcessRepository, Maintenance

mod connection;
mod maintenance_impl;
mod migration;
mod process_repository;

pub use connection::create_pool;
pub use maintenance_impl::SqliteMaintenance;
pub use migration::run_migrations;
pub use process_repository::SqliteProcessRepository;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
