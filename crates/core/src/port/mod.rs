// Port Layer - Interfaces for external dependencies

pub mod file_store;
pub mod id_provider; // For deterministic testing
pub mod maintenance;
pub mod process_repository;
pub mod script_executor;
pub mod time_provider;

// Re-exports
pub use file_store::FileStore;
pub use id_provider::IdProvider;
pub use maintenance::{Maintenance, MaintenanceConfig, MaintenanceStats};
pub use process_repository::ProcessRepository;
pub use script_executor::{ExecutionError, ExecutionResult, ExecutionStatus, ScriptExecutor};
pub use time_provider::TimeProvider;
