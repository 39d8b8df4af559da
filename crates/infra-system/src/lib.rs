// Curator Infrastructure - System Adapters
// Implements: ScriptExecutor (subprocess), FileStore (filesystem workspaces)

mod subprocess_executor;
mod workspace_store;

pub use subprocess_executor::SubprocessScriptExecutor;
pub use workspace_store::FsWorkspaceStore;
