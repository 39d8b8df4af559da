// Subprocess executor implementation
// Spawns script programs as isolated child processes inside their workspace
use async_trait::async_trait;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use curator_core::domain::Process;
use curator_core::port::script_executor::{
    ExecutionError, ExecutionResult, ExecutionStatus, ScriptExecutor,
};
use curator_core::port::TimeProvider;
use std::sync::Arc;

/// Subprocess script executor
///
/// Spawns the script's program with the assembled argument vector, working
/// directory set to the process workspace, and stdout/stderr captured into
/// the process log. Environment passed to the child is restricted to an
/// allowlist.
pub struct SubprocessScriptExecutor {
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
}

impl SubprocessScriptExecutor {
    /// Create a new subprocess executor
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    /// * `env_allowlist` - Environment variables the child may inherit
    pub fn new(time_provider: Arc<dyn TimeProvider>, env_allowlist: Vec<String>) -> Self {
        Self {
            time_provider,
            env_allowlist,
        }
    }

    /// Restrict the daemon's environment to the allowlist
    fn filtered_env(&self) -> HashMap<String, String> {
        std::env::vars()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }

    /// Open the process log for stdout/stderr capture
    fn open_log(log_path: &str) -> Result<(Stdio, Stdio), ExecutionError> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .map_err(|e| ExecutionError::IoError(format!("open log {}: {}", log_path, e)))?;
        let stderr_file = file
            .try_clone()
            .map_err(|e| ExecutionError::IoError(e.to_string()))?;
        Ok((Stdio::from(file), Stdio::from(stderr_file)))
    }

    /// Kill process with SIGTERM first, then SIGKILL if needed
    async fn kill_graceful(&self, pid: i32) -> Result<(), ExecutionError> {
        const GRACEFUL_TIMEOUT_MS: i64 =
            curator_core::application::worker::constants::GRACEFUL_SHUTDOWN_TIMEOUT_MS;

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            info!(pid = %pid, "Sending SIGTERM for graceful shutdown");
            kill(Pid::from_raw(pid), Signal::SIGTERM)
                .map_err(|e| ExecutionError::Killed(format!("SIGTERM failed: {}", e)))?;

            // Poll for exit; escalate to SIGKILL after the timeout
            let start_time = self.time_provider.now_millis();
            loop {
                tokio::time::sleep(Duration::from_millis(100)).await;

                if kill(Pid::from_raw(pid), None).is_err() {
                    info!(pid = %pid, "Process exited gracefully after SIGTERM");
                    return Ok(());
                }

                if self.time_provider.now_millis() - start_time > GRACEFUL_TIMEOUT_MS {
                    warn!(pid = %pid, "Process did not exit after SIGTERM, sending SIGKILL");
                    kill(Pid::from_raw(pid), Signal::SIGKILL)
                        .map_err(|e| ExecutionError::Killed(format!("SIGKILL failed: {}", e)))?;
                    return Ok(());
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = GRACEFUL_TIMEOUT_MS;
            Err(ExecutionError::Killed(format!(
                "Kill not supported on this platform (pid {})",
                pid
            )))
        }
    }
}

#[async_trait]
impl ScriptExecutor for SubprocessScriptExecutor {
    async fn execute(
        &self,
        process: &Process,
        program: &str,
        args: &[String],
    ) -> Result<ExecutionResult, ExecutionError> {
        let workspace = process
            .workspace_path
            .as_deref()
            .ok_or_else(|| ExecutionError::MissingWorkspace(process.id.clone()))?;

        let start_time = self.time_provider.now_millis();

        info!(
            process_id = %process.id,
            program = %program,
            args = ?args,
            workspace = %workspace,
            "Starting subprocess execution"
        );

        let (stdout, stderr) = match process.log_path.as_deref() {
            Some(log_path) => Self::open_log(log_path)?,
            None => (Stdio::null(), Stdio::null()),
        };

        let mut child = Command::new(program)
            .args(args)
            .env_clear()
            .envs(self.filtered_env())
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(e.to_string()))?;

        let pid = child.id().map(|p| p as i32);

        let exit = child
            .wait()
            .await
            .map_err(|e| ExecutionError::IoError(e.to_string()))?;

        let duration_ms = self.time_provider.now_millis() - start_time;
        let status = if exit.success() {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failed
        };

        info!(
            process_id = %process.id,
            duration_ms = %duration_ms,
            exit_code = ?exit.code(),
            status = ?status,
            "Subprocess execution completed"
        );

        Ok(ExecutionResult {
            status,
            duration_ms,
            exit_code: exit.code(),
            pid,
        })
    }

    async fn kill(&self, pid: i32) -> Result<(), ExecutionError> {
        self.kill_graceful(pid).await
    }

    fn is_alive(&self, pid: i32) -> bool {
        #[cfg(unix)]
        {
            use nix::sys::signal::kill;
            use nix::unistd::Pid;

            // Signal 0 checks existence without delivering anything
            kill(Pid::from_raw(pid), None).is_ok()
        }

        #[cfg(not(unix))]
        {
            let _ = pid;
            false
        }
    }
}
