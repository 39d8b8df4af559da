// Worker - Process execution loop

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::registry::ScriptRegistry;
use crate::domain::parameter::assemble_args;
use crate::error::Result;
use crate::port::{ExecutionStatus, ProcessRepository, ScriptExecutor, TimeProvider};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info};

/// Worker drains the scheduled pool and runs one process at a time.
///
/// Execution happens inside a spawned task so a panicking script adapter
/// can never take the daemon down with it.
pub struct Worker {
    registry: Arc<ScriptRegistry>,
    process_repo: Arc<dyn ProcessRepository>,
    script_executor: Arc<dyn ScriptExecutor>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Worker {
    pub fn new(
        registry: Arc<ScriptRegistry>,
        process_repo: Arc<dyn ProcessRepository>,
        script_executor: Arc<dyn ScriptExecutor>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            registry,
            process_repo,
            script_executor,
            time_provider,
        }
    }

    /// Run worker loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!("Worker started");
        loop {
            // Check for shutdown signal
            if shutdown.is_shutdown() {
                info!("Worker shutting down");
                break;
            }
            match self.process_next().await {
                Ok(processed) => {
                    if !processed {
                        // No process available, sleep briefly (or wait for shutdown)
                        tokio::select! {
                            _ = sleep(IDLE_SLEEP_DURATION) => {},
                            _ = shutdown.wait() => {
                                info!("Worker interrupted during idle");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Worker error: {}", e);
                    tokio::select! {
                        _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => {
                            info!("Worker interrupted during error recovery");
                            break;
                        }
                    }
                }
            }
        }
        info!("Worker stopped");
        Ok(())
    }

    /// Claim and run the next scheduled process (returns true if one ran)
    pub async fn process_next(&self) -> Result<bool> {
        let now = self.time_provider.now_millis();

        // Claim atomically: the handle comes back already RUNNING
        let mut process = match self.process_repo.pop_next_scheduled(now).await? {
            Some(p) => p,
            None => return Ok(false),
        };

        info!(
            process_id = %process.id,
            script = %process.script_name,
            "Executing process"
        );

        let descriptor = match self.registry.resolve(&process.script_name) {
            Some(d) => d.clone(),
            None => {
                // Registry changed between launch and pickup only across a
                // daemon restart with edited config; terminal failure
                let now = self.time_provider.now_millis();
                process.fail(
                    now,
                    format!("Script no longer registered: {}", process.script_name),
                );
                self.process_repo.update(&process).await?;
                return Ok(true);
            }
        };

        let args = assemble_args(&process.parameters);

        // Execute inside a spawned task; a panic is caught at the
        // JoinHandle instead of unwinding through the loop
        let executor = Arc::clone(&self.script_executor);
        let process_arc = Arc::new(process);
        let process_for_exec = Arc::clone(&process_arc);
        let handle = tokio::task::spawn(async move {
            executor
                .execute(&process_for_exec, &descriptor.program, &args)
                .await
        });
        let execution_result = handle.await;

        let mut process = Arc::try_unwrap(process_arc).unwrap_or_else(|arc| (*arc).clone());
        let now = self.time_provider.now_millis();

        match execution_result {
            Ok(Ok(result)) => {
                process.pid = result.pid;
                process.exit_code = result.exit_code;
                match result.status {
                    ExecutionStatus::Success => {
                        process.complete(now)?;
                        info!(
                            process_id = %process.id,
                            duration_ms = %result.duration_ms,
                            "Process completed"
                        );
                    }
                    ExecutionStatus::Failed | ExecutionStatus::Killed => {
                        process.fail(
                            now,
                            format!("Script exited with status {:?}", result.exit_code),
                        );
                        error!(
                            process_id = %process.id,
                            exit_code = ?result.exit_code,
                            "Process failed"
                        );
                    }
                }
                self.process_repo.update(&process).await?;
            }
            Ok(Err(e)) => {
                error!(process_id = %process.id, error = %e, "Process execution error");
                process.fail(now, e.to_string());
                self.process_repo.update(&process).await?;
            }
            Err(join_err) => {
                // Executor panicked or the task was cancelled
                if join_err.is_panic() {
                    error!(process_id = %process.id, error = ?join_err, "Process executor panicked");
                } else {
                    error!(process_id = %process.id, error = ?join_err, "Process task cancelled");
                }
                process.fail(now, format!("Executor aborted: {}", join_err));
                self.process_repo.update(&process).await?;
            }
        }
        Ok(true)
    }
}
