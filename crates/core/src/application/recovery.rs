// Crash recovery logic
use crate::domain::{Process, ProcessStatus};
use crate::port::{ProcessRepository, ScriptExecutor, TimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::worker::constants::DEFAULT_RECOVERY_WINDOW_MS;

/// Crash recovery service
///
/// On daemon startup, detects processes that were RUNNING when the daemon
/// died and marks them Failed (killing any still-live pid first).
pub struct RecoveryService {
    process_repo: Arc<dyn ProcessRepository>,
    script_executor: Arc<dyn ScriptExecutor>,
    time_provider: Arc<dyn TimeProvider>,
    recovery_window_ms: i64,
}

impl RecoveryService {
    /// Create a new recovery service
    ///
    /// # Arguments
    /// * `process_repo` - Process repository
    /// * `script_executor` - Executor, for checking/killing live pids
    /// * `time_provider` - Time provider
    /// * `recovery_window_ms` - Optional custom recovery window (default: 5 minutes)
    pub fn new(
        process_repo: Arc<dyn ProcessRepository>,
        script_executor: Arc<dyn ScriptExecutor>,
        time_provider: Arc<dyn TimeProvider>,
        recovery_window_ms: Option<i64>,
    ) -> Self {
        Self {
            process_repo,
            script_executor,
            time_provider,
            recovery_window_ms: recovery_window_ms.unwrap_or(DEFAULT_RECOVERY_WINDOW_MS),
        }
    }

    /// Recover orphaned processes on daemon startup
    ///
    /// 1. Find all RUNNING processes with `started_at < now - window`
    /// 2. If the recorded pid is still alive, kill it
    /// 3. Mark the process FAILED
    ///
    /// # Returns
    /// Number of processes recovered
    pub async fn recover_orphaned_processes(&self) -> crate::error::Result<usize> {
        let now = self.time_provider.now_millis();
        let cutoff = now - self.recovery_window_ms;

        info!(
            cutoff_time = %cutoff,
            recovery_window_ms = %self.recovery_window_ms,
            "Starting orphaned process recovery"
        );

        let running = self.process_repo.find_by_status(ProcessStatus::Running).await?;
        let mut recovered_count = 0;

        for mut process in running {
            match process.started_at {
                Some(started_at) if started_at < cutoff => {
                    info!(
                        process_id = %process.id,
                        started_at = %started_at,
                        pid = ?process.pid,
                        "Recovering orphaned process"
                    );
                    self.recover_single(&mut process).await?;
                    recovered_count += 1;
                }
                Some(_) => {}
                None => {
                    // RUNNING without started_at is inconsistent state
                    warn!(
                        process_id = %process.id,
                        "RUNNING process without started_at, marking as FAILED"
                    );
                    let now = self.time_provider.now_millis();
                    process.fail(now, "inconsistent state after restart");
                    self.process_repo.update(&process).await?;
                    recovered_count += 1;
                }
            }
        }

        info!(recovered_count = %recovered_count, "Orphaned process recovery complete");
        Ok(recovered_count)
    }

    async fn recover_single(&self, process: &mut Process) -> crate::error::Result<()> {
        if let Some(pid) = process.pid {
            if self.script_executor.is_alive(pid) {
                warn!(
                    process_id = %process.id,
                    pid = %pid,
                    "Orphaned process still alive, killing"
                );
                if let Err(e) = self.script_executor.kill(pid).await {
                    warn!(pid = %pid, error = %e, "Failed to kill orphaned pid");
                }
            }
        }

        let now = self.time_provider.now_millis();
        process.fail(now, "daemon restarted while process was running");
        self.process_repo.update(process).await?;
        Ok(())
    }
}
