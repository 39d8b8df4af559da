// Application Layer - Use Cases and Business Logic

pub mod launch;
pub mod maintenance;
pub mod recovery;
pub mod registry;
pub mod worker;

// Re-exports
pub use launch::{LaunchRequest, LaunchService};
pub use maintenance::MaintenanceScheduler;
pub use registry::ScriptRegistry;
pub use worker::{shutdown_channel, ShutdownSender, ShutdownToken, Worker};
