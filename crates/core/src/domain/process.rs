// Process Domain Model

use crate::domain::parameter::CommandLineParameter;
use crate::domain::principal::Principal;
use serde::{Deserialize, Serialize};

/// Process ID (UUID v4)
pub type ProcessId = String;

/// Process lifecycle status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessStatus {
    Scheduled,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessStatus::Scheduled => write!(f, "SCHEDULED"),
            ProcessStatus::Running => write!(f, "RUNNING"),
            ProcessStatus::Completed => write!(f, "COMPLETED"),
            ProcessStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for ProcessStatus {
    type Err = crate::domain::error::DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(ProcessStatus::Scheduled),
            "RUNNING" => Ok(ProcessStatus::Running),
            "COMPLETED" => Ok(ProcessStatus::Completed),
            "FAILED" => Ok(ProcessStatus::Failed),
            other => Err(crate::domain::error::DomainError::Internal(format!(
                "Unknown process status: {}",
                other
            ))),
        }
    }
}

/// The tracked handle for one launched script.
///
/// Created on successful launch, owned by the launching request until it
/// is handed to the process registry. Retention afterwards is the
/// maintenance service's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub id: ProcessId,
    pub script_name: String,
    pub owner: Principal,

    /// Parameters exactly as requested, input order preserved
    pub parameters: Vec<CommandLineParameter>,

    /// Original filenames of the uploaded files bound to this launch
    pub file_names: Vec<String>,

    pub status: ProcessStatus,

    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,

    /// Private workspace holding the uploaded files; cwd of the spawned
    /// program
    pub workspace_path: Option<String>,
    pub log_path: Option<String>,

    pub pid: Option<i32>,
    pub exit_code: Option<i32>,
    pub failure_message: Option<String>,
}

impl Process {
    /// Create a new process handle in `Scheduled` state
    ///
    /// # Arguments
    ///
    /// * `id` - Unique process ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `script_name` - Registry key of the launched script
    /// * `owner` - Launching principal, ambient groups included
    /// * `parameters` - Requested parameter list
    /// * `file_names` - Uploaded filenames bound to this launch
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        script_name: impl Into<String>,
        owner: Principal,
        parameters: Vec<CommandLineParameter>,
        file_names: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            script_name: script_name.into(),
            owner,
            parameters,
            file_names,
            status: ProcessStatus::Scheduled,
            created_at,
            started_at: None,
            finished_at: None,
            workspace_path: None,
            log_path: None,
            pid: None,
            exit_code: None,
            failure_message: None,
        }
    }

    /// Create a test process with deterministic ID and timestamp.
    ///
    /// Uses a simple counter (proc-1, proc-2, ...); timestamps start at
    /// 1000 and increment by 1000. Tests only - production code injects
    /// ID and time via providers.
    pub fn new_test(script_name: impl Into<String>, owner: Principal) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

        let counter = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::new(
            format!("proc-{}", counter),
            (counter * 1000) as i64,
            script_name,
            owner,
            Vec::new(),
            Vec::new(),
        )
    }

    /// Transition to Running with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.status != ProcessStatus::Scheduled {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "RUNNING".to_string(),
            });
        }
        self.status = ProcessStatus::Running;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Completed with explicit timestamp
    pub fn complete(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.status != ProcessStatus::Running {
            return Err(crate::domain::error::DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "COMPLETED".to_string(),
            });
        }
        self.status = ProcessStatus::Completed;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Mark as Failed with explicit timestamp.
    ///
    /// Unconditional: a process may fail from any state (argument-parse
    /// failures fail it straight out of Scheduled).
    pub fn fail(&mut self, now_millis: i64, message: impl Into<String>) {
        self.status = ProcessStatus::Failed;
        self.finished_at = Some(now_millis);
        self.failure_message = Some(message.into());
    }

    /// Terminal statuses are eligible for retention cleanup
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            ProcessStatus::Completed | ProcessStatus::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut process = Process::new(
            "p-1",
            1000,
            "metadata-export",
            Principal::admin("root"),
            vec![CommandLineParameter::with_value("-i", "data.csv")],
            vec!["data.csv".to_string()],
        );

        assert_eq!(process.status, ProcessStatus::Scheduled);
        assert!(process.started_at.is_none());

        assert!(process.start(2000).is_ok());
        assert_eq!(process.status, ProcessStatus::Running);

        assert!(process.complete(3000).is_ok());
        assert_eq!(process.status, ProcessStatus::Completed);
        assert_eq!(process.finished_at, Some(3000));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut process = Process::new_test("metadata-export", Principal::admin("root"));

        // Cannot complete without starting
        assert!(process.complete(100).is_err());

        assert!(process.start(200).is_ok());
        // Cannot start twice
        assert!(process.start(300).is_err());
    }

    #[test]
    fn test_fail_from_scheduled() {
        let mut process = Process::new_test("metadata-export", Principal::admin("root"));

        process.fail(500, "argument parse failed");
        assert_eq!(process.status, ProcessStatus::Failed);
        assert_eq!(
            process.failure_message.as_deref(),
            Some("argument parse failed")
        );
        assert!(process.is_finished());
    }
}
