// Process Repository Port (Interface)

use crate::domain::{Process, ProcessId, ProcessStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Process persistence
#[async_trait]
pub trait ProcessRepository: Send + Sync {
    /// Insert a new process handle
    async fn insert(&self, process: &Process) -> Result<()>;

    /// Find process by ID
    async fn find_by_id(&self, id: &ProcessId) -> Result<Option<Process>>;

    /// Update process
    async fn update(&self, process: &Process) -> Result<()>;

    /// Claim the next scheduled process (FIFO by creation time).
    ///
    /// The claim is atomic: the returned process is already RUNNING in the
    /// store with `started_at` set, so two workers never pick up the same
    /// handle.
    async fn pop_next_scheduled(&self, now_millis: i64) -> Result<Option<Process>>;

    /// Find all processes in a given status (used by crash recovery)
    async fn find_by_status(&self, status: ProcessStatus) -> Result<Vec<Process>>;

    /// Count processes in a given status
    async fn count_by_status(&self, status: ProcessStatus) -> Result<i64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory ProcessRepository for unit tests
    #[derive(Default)]
    pub struct MemoryProcessRepository {
        processes: Mutex<BTreeMap<ProcessId, Process>>,
        /// Updates left before update() starts failing; None = never fails
        /// (exercises best-effort failure recording)
        updates_before_failure: Mutex<Option<u64>>,
    }

    impl MemoryProcessRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Let the next `n` updates succeed, then fail every one after
        pub fn fail_updates_after(&self, n: u64) {
            *self.updates_before_failure.lock().unwrap() = Some(n);
        }
    }

    #[async_trait]
    impl ProcessRepository for MemoryProcessRepository {
        async fn insert(&self, process: &Process) -> Result<()> {
            let mut map = self.processes.lock().unwrap();
            if map.contains_key(&process.id) {
                return Err(crate::error::AppError::Conflict(format!(
                    "Process already exists: {}",
                    process.id
                )));
            }
            map.insert(process.id.clone(), process.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &ProcessId) -> Result<Option<Process>> {
            Ok(self.processes.lock().unwrap().get(id).cloned())
        }

        async fn update(&self, process: &Process) -> Result<()> {
            if let Some(remaining) = self.updates_before_failure.lock().unwrap().as_mut() {
                if *remaining == 0 {
                    return Err(crate::error::AppError::Database(
                        "update rejected by test".to_string(),
                    ));
                }
                *remaining -= 1;
            }
            self.processes
                .lock()
                .unwrap()
                .insert(process.id.clone(), process.clone());
            Ok(())
        }

        async fn pop_next_scheduled(&self, now_millis: i64) -> Result<Option<Process>> {
            let mut map = self.processes.lock().unwrap();
            let next_id = map
                .values()
                .filter(|p| p.status == ProcessStatus::Scheduled)
                .min_by_key(|p| p.created_at)
                .map(|p| p.id.clone());

            if let Some(id) = next_id {
                let process = map.get_mut(&id).unwrap();
                process.status = ProcessStatus::Running;
                process.started_at = Some(now_millis);
                return Ok(Some(process.clone()));
            }
            Ok(None)
        }

        async fn find_by_status(&self, status: ProcessStatus) -> Result<Vec<Process>> {
            Ok(self
                .processes
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.status == status)
                .cloned()
                .collect())
        }

        async fn count_by_status(&self, status: ProcessStatus) -> Result<i64> {
            Ok(self.find_by_status(status).await?.len() as i64)
        }
    }
}
