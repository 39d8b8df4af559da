// File Store Port
// Per-process workspaces and uploaded-file streaming

use crate::domain::{ProcessId, UploadedFile};
use crate::error::Result;
use async_trait::async_trait;

/// A created workspace: the directory the process owns and the log file
/// inside it
#[derive(Debug, Clone)]
pub struct Workspace {
    pub dir: String,
    pub log_path: String,
}

/// File Store trait
///
/// Each launch owns an independent workspace, so concurrent processes
/// never share mutable files.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Create the private workspace for a process
    async fn create_workspace(&self, process_id: &ProcessId) -> Result<Workspace>;

    /// Stream an uploaded file into the workspace under its declared
    /// option name
    async fn write_input_file(
        &self,
        workspace: &Workspace,
        option_name: &str,
        file: &UploadedFile,
    ) -> Result<()>;

    /// Append a line of text to the process log
    async fn append_log(&self, workspace: &Workspace, text: &str) -> Result<()>;

    /// Read the last `lines` lines of the process log
    async fn tail_log(&self, log_path: &str, lines: usize) -> Result<Vec<String>>;

    /// Delete a workspace and everything in it (retention cleanup)
    async fn remove_workspace(&self, dir: &str) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory FileStore that records every write
    #[derive(Default)]
    pub struct MemoryFileStore {
        /// (workspace dir, option name, filename) -> bytes
        pub files: Mutex<BTreeMap<(String, String, String), Vec<u8>>>,
        pub logs: Mutex<BTreeMap<String, Vec<String>>>,
    }

    impl MemoryFileStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn written_file_count(&self) -> usize {
            self.files.lock().unwrap().len()
        }

        pub fn log_lines(&self, dir: &str) -> Vec<String> {
            self.logs
                .lock()
                .unwrap()
                .get(dir)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl FileStore for MemoryFileStore {
        async fn create_workspace(&self, process_id: &ProcessId) -> Result<Workspace> {
            Ok(Workspace {
                dir: format!("mem://{}", process_id),
                log_path: format!("mem://{}/process.log", process_id),
            })
        }

        async fn write_input_file(
            &self,
            workspace: &Workspace,
            option_name: &str,
            file: &UploadedFile,
        ) -> Result<()> {
            self.files.lock().unwrap().insert(
                (
                    workspace.dir.clone(),
                    option_name.to_string(),
                    file.filename.clone(),
                ),
                file.bytes.clone(),
            );
            Ok(())
        }

        async fn append_log(&self, workspace: &Workspace, text: &str) -> Result<()> {
            self.logs
                .lock()
                .unwrap()
                .entry(workspace.dir.clone())
                .or_default()
                .push(text.to_string());
            Ok(())
        }

        async fn tail_log(&self, log_path: &str, lines: usize) -> Result<Vec<String>> {
            let dir = log_path.trim_end_matches("/process.log").to_string();
            let all = self.log_lines(&dir);
            let start = all.len().saturating_sub(lines);
            Ok(all[start..].to_vec())
        }

        async fn remove_workspace(&self, dir: &str) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .retain(|(d, _, _), _| d != dir);
            self.logs.lock().unwrap().remove(dir);
            Ok(())
        }
    }
}
