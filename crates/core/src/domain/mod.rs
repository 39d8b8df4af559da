// Domain Layer - Pure business logic and entities

pub mod error;
pub mod parameter;
pub mod principal;
pub mod process;
pub mod script;
pub mod upload;

// Re-exports
pub use error::DomainError;
pub use parameter::CommandLineParameter;
pub use principal::Principal;
pub use process::{Process, ProcessId, ProcessStatus};
pub use script::{AccessRule, ArgumentError, ParameterSpec, ScriptDescriptor};
pub use upload::UploadedFile;
