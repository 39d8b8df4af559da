// Filesystem workspace store
// One private directory per process; uploaded files land under their
// declared option name

use async_trait::async_trait;
use curator_core::domain::{ProcessId, UploadedFile};
use curator_core::error::{AppError, Result};
use curator_core::port::file_store::{FileStore, Workspace};
use std::path::{Path, PathBuf};
use tracing::debug;

const LOG_FILENAME: &str = "process.log";

pub struct FsWorkspaceStore {
    base_dir: PathBuf,
}

impl FsWorkspaceStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Reject names that would escape the workspace directory
    fn safe_name(name: &str) -> Result<&str> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(AppError::Validation(format!(
                "Illegal file name: {}",
                name
            )));
        }
        Ok(name)
    }
}

#[async_trait]
impl FileStore for FsWorkspaceStore {
    async fn create_workspace(&self, process_id: &ProcessId) -> Result<Workspace> {
        let dir = self.base_dir.join(Self::safe_name(process_id)?);
        tokio::fs::create_dir_all(&dir).await?;

        let log_path = dir.join(LOG_FILENAME);
        tokio::fs::File::create(&log_path).await?;

        debug!(process_id = %process_id, dir = %dir.display(), "Workspace created");
        Ok(Workspace {
            dir: dir.to_string_lossy().into_owned(),
            log_path: log_path.to_string_lossy().into_owned(),
        })
    }

    async fn write_input_file(
        &self,
        workspace: &Workspace,
        option_name: &str,
        file: &UploadedFile,
    ) -> Result<()> {
        let path = Path::new(&workspace.dir).join(Self::safe_name(option_name)?);
        tokio::fs::write(&path, &file.bytes).await?;

        debug!(
            path = %path.display(),
            bytes = file.bytes.len(),
            original_filename = %file.filename,
            "Input file written"
        );
        Ok(())
    }

    async fn append_log(&self, workspace: &Workspace, text: &str) -> Result<()> {
        use tokio::io::AsyncWriteExt;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&workspace.log_path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        if !text.ends_with('\n') {
            file.write_all(b"\n").await?;
        }
        Ok(())
    }

    async fn tail_log(&self, log_path: &str, lines: usize) -> Result<Vec<String>> {
        let content = match tokio::fs::read_to_string(log_path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let all: Vec<&str> = content.lines().collect();
        let start = all.len().saturating_sub(lines);
        Ok(all[start..].iter().map(|s| s.to_string()).collect())
    }

    async fn remove_workspace(&self, dir: &str) -> Result<()> {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workspace_round_trip() {
        let base = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(base.path());

        let workspace = store
            .create_workspace(&"proc-1".to_string())
            .await
            .unwrap();
        assert!(Path::new(&workspace.log_path).exists());

        let file = UploadedFile::new("data.csv", b"a,b,c".to_vec());
        store
            .write_input_file(&workspace, "data.csv", &file)
            .await
            .unwrap();

        let written = std::fs::read(Path::new(&workspace.dir).join("data.csv")).unwrap();
        assert_eq!(written, b"a,b,c");

        store.append_log(&workspace, "usage: import").await.unwrap();
        let tail = store.tail_log(&workspace.log_path, 10).await.unwrap();
        assert_eq!(tail, vec!["usage: import"]);

        store.remove_workspace(&workspace.dir).await.unwrap();
        assert!(!Path::new(&workspace.dir).exists());
        // Removing twice is fine
        store.remove_workspace(&workspace.dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_names() {
        let base = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(base.path());
        let workspace = store
            .create_workspace(&"proc-2".to_string())
            .await
            .unwrap();

        let file = UploadedFile::new("evil", b"x".to_vec());
        assert!(store
            .write_input_file(&workspace, "../evil", &file)
            .await
            .is_err());
        assert!(store
            .write_input_file(&workspace, "a/b", &file)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_tail_log_returns_last_lines() {
        let base = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(base.path());
        let workspace = store
            .create_workspace(&"proc-3".to_string())
            .await
            .unwrap();

        for i in 0..10 {
            store.append_log(&workspace, &format!("line {}", i)).await.unwrap();
        }

        let tail = store.tail_log(&workspace.log_path, 3).await.unwrap();
        assert_eq!(tail, vec!["line 7", "line 8", "line 9"]);
    }
}
