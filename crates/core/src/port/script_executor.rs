// Script Executor Port
// Abstraction for running a script's program as a child process

use crate::domain::Process;
use async_trait::async_trait;
use thiserror::Error;

/// Result of one script execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub duration_ms: i64,
    pub exit_code: Option<i32>,
    pub pid: Option<i32>,
}

/// Execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
    Killed,
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process killed: {0}")]
    Killed(String),

    #[error("Missing workspace for process {0}")]
    MissingWorkspace(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Script Executor trait
///
/// The production implementation spawns the script's program as a child
/// process inside the handle's workspace, with stdout/stderr captured to
/// the process log.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Run `program` with `args` on behalf of `process` and wait for exit
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the program cannot be started
    /// - ExecutionError::MissingWorkspace if the handle has no workspace
    async fn execute(
        &self,
        process: &Process,
        program: &str,
        args: &[String],
    ) -> Result<ExecutionResult, ExecutionError>;

    /// Kill a running child by PID (graceful, then forced)
    async fn kill(&self, pid: i32) -> Result<(), ExecutionError>;

    /// Check whether a PID is still alive
    fn is_alive(&self, pid: i32) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Always succeed with exit code 0
        Success,
        /// Always fail to spawn with message
        Fail(String),
        /// Exit nonzero
        NonZeroExit(i32),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// Mock Script Executor for testing
    pub struct MockScriptExecutor {
        behavior: Arc<Mutex<MockBehavior>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockScriptExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }

        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl ScriptExecutor for MockScriptExecutor {
        async fn execute(
            &self,
            _process: &Process,
            _program: &str,
            _args: &[String],
        ) -> Result<ExecutionResult, ExecutionError> {
            *self.call_count.lock().unwrap() += 1;

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Success => Ok(ExecutionResult {
                    status: ExecutionStatus::Success,
                    duration_ms: 100,
                    exit_code: Some(0),
                    pid: Some(4242),
                }),
                MockBehavior::NonZeroExit(code) => Ok(ExecutionResult {
                    status: ExecutionStatus::Failed,
                    duration_ms: 100,
                    exit_code: Some(code),
                    pid: Some(4242),
                }),
                MockBehavior::Fail(msg) => Err(ExecutionError::SpawnFailed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
            }
        }

        async fn kill(&self, _pid: i32) -> Result<(), ExecutionError> {
            Ok(())
        }

        fn is_alive(&self, _pid: i32) -> bool {
            false
        }
    }
}
