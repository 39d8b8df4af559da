// Launch Use Case - resolve, authorize, assemble, schedule

pub mod files;
pub mod parameters;
pub mod usage;

use crate::application::registry::ScriptRegistry;
use crate::domain::parameter::assemble_args;
use crate::domain::{Principal, Process, UploadedFile};
use crate::error::Result;
use crate::port::{FileStore, IdProvider, ProcessRepository, TimeProvider};
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything a launch request carries
#[derive(Debug)]
pub struct LaunchRequest {
    pub script_name: String,

    /// Raw `properties` payload: a JSON array of `{name, value?}` objects
    pub properties: Option<String>,

    pub files: Vec<UploadedFile>,
    pub principal: Principal,
}

/// Launch Service
///
/// Drives the whole request-side flow: resolve the script, check the
/// caller, validate the uploads, bind a tracked handle, stream the files
/// into its workspace, and leave the handle Scheduled for the worker.
/// The call returns the handle immediately; execution is fire-and-forget.
pub struct LaunchService {
    registry: Arc<ScriptRegistry>,
    process_repo: Arc<dyn ProcessRepository>,
    file_store: Arc<dyn FileStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl LaunchService {
    pub fn new(
        registry: Arc<ScriptRegistry>,
        process_repo: Arc<dyn ProcessRepository>,
        file_store: Arc<dyn FileStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            registry,
            process_repo,
            file_store,
            id_provider,
            time_provider,
        }
    }

    /// Launch a script as a tracked background process.
    ///
    /// Errors before the handle is created surface to the caller:
    /// NotFound (unknown script), Forbidden (authorization denied),
    /// Validation (malformed payload, duplicate filename, missing
    /// required file). An argument-parse failure after the handle exists
    /// is recovered: the usage text goes to the process log, a Failed
    /// status is best-effort recorded, and the handle is still returned.
    pub async fn launch(&self, request: LaunchRequest) -> Result<Process> {
        let descriptor = self
            .registry
            .resolve(&request.script_name)
            .ok_or_else(|| {
                crate::error::AppError::NotFound(format!(
                    "The script for name: {} wasn't found",
                    request.script_name
                ))
            })?;

        let parameters = parameters::parse_properties(request.properties.as_deref())?;
        self.registry
            .authorize_launch(descriptor, &request.principal, &parameters)?;

        // All-or-nothing file validation, before anything touches disk
        files::validate_files(descriptor, &request.files)?;

        // Bind the process-tracking handle: owner, script name, parameters,
        // and the caller's ambient group memberships (carried inside the
        // principal)
        let process_id = self.id_provider.generate_id();
        let created_at = self.time_provider.now_millis();
        let file_names: Vec<String> = request.files.iter().map(|f| f.filename.clone()).collect();

        let mut process = Process::new(
            process_id,
            created_at,
            descriptor.name.clone(),
            request.principal,
            parameters.clone(),
            file_names,
        );
        self.process_repo.insert(&process).await?;

        let workspace = self.file_store.create_workspace(&process.id).await?;
        process.workspace_path = Some(workspace.dir.clone());
        process.log_path = Some(workspace.log_path.clone());
        self.process_repo.update(&process).await?;

        let args = assemble_args(&parameters);
        if let Err(parse_err) = descriptor.check_arguments(&args) {
            // Recovered path: emit usage text and best-effort record the
            // failure on the handle. Nothing here re-raises; the caller
            // still receives the created process resource.
            warn!(
                process_id = %process.id,
                script = %descriptor.name,
                error = %parse_err,
                "Failed to parse the arguments given to the script"
            );

            let usage_text = usage::render_usage(descriptor);
            if let Err(log_err) = self.file_store.append_log(&workspace, &usage_text).await {
                debug!(process_id = %process.id, error = %log_err, "Could not write usage text to process log");
            }

            let now = self.time_provider.now_millis();
            process.fail(
                now,
                format!(
                    "Failed to parse the arguments given to the script with name: {} and args: {:?}",
                    descriptor.name, args
                ),
            );
            if let Err(record_err) = self.process_repo.update(&process).await {
                // Recording the failure is itself best-effort
                warn!(
                    process_id = %process.id,
                    error = %record_err,
                    "Could not record argument-parse failure on process"
                );
            }
            return Ok(process);
        }

        // Stream each uploaded file into the private workspace under its
        // declared option name
        for file in &request.files {
            let option_name = descriptor
                .input_file_options
                .iter()
                .find(|o| o.as_str() == file.filename)
                .map(|o| o.as_str())
                .unwrap_or(&file.filename);
            self.file_store
                .write_input_file(&workspace, option_name, file)
                .await?;
        }

        debug!(
            process_id = %process.id,
            script = %process.script_name,
            "Process scheduled"
        );
        Ok(process)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccessRule, ParameterSpec, ProcessStatus, ScriptDescriptor};
    use crate::error::AppError;
    use crate::port::file_store::mocks::MemoryFileStore;
    use crate::port::id_provider::UuidProvider;
    use crate::port::process_repository::mocks::MemoryProcessRepository;
    use crate::port::time_provider::SystemTimeProvider;

    fn registry() -> ScriptRegistry {
        let mut registry = ScriptRegistry::new();
        registry
            .register(ScriptDescriptor {
                name: "import".to_string(),
                description: "Import records".to_string(),
                program: "/usr/local/bin/import".to_string(),
                parameters: vec![
                    ParameterSpec {
                        name: "-f".to_string(),
                        takes_value: true,
                        required: true,
                        description: "input file".to_string(),
                    },
                    ParameterSpec {
                        name: "-v".to_string(),
                        takes_value: false,
                        required: false,
                        description: "verbose".to_string(),
                    },
                ],
                input_file_options: vec!["data".to_string()],
                access: AccessRule::Authenticated,
            })
            .unwrap();
        registry
    }

    fn service(
        registry: ScriptRegistry,
    ) -> (
        LaunchService,
        Arc<MemoryProcessRepository>,
        Arc<MemoryFileStore>,
    ) {
        let repo = Arc::new(MemoryProcessRepository::new());
        let store = Arc::new(MemoryFileStore::new());
        let service = LaunchService::new(
            Arc::new(registry),
            repo.clone(),
            store.clone(),
            Arc::new(UuidProvider),
            Arc::new(SystemTimeProvider),
        );
        (service, repo, store)
    }

    fn request(properties: &str, files: Vec<UploadedFile>) -> LaunchRequest {
        LaunchRequest {
            script_name: "import".to_string(),
            properties: Some(properties.to_string()),
            files,
            principal: Principal::new("alice", vec![]),
        }
    }

    #[tokio::test]
    async fn test_launch_unknown_script_is_not_found() {
        let (service, _, _) = service(registry());
        let mut req = request("[]", vec![]);
        req.script_name = "missing".to_string();

        assert!(matches!(
            service.launch(req).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_launch_schedules_and_writes_files() {
        let (service, repo, store) = service(registry());
        let req = request(
            r#"[{"name":"-f","value":"data"}]"#,
            vec![UploadedFile::new("data", b"a,b,c".to_vec())],
        );

        let process = service.launch(req).await.unwrap();
        assert_eq!(process.status, ProcessStatus::Scheduled);
        assert!(process.workspace_path.is_some());
        assert_eq!(store.written_file_count(), 1);

        let stored = repo.find_by_id(&process.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProcessStatus::Scheduled);
        assert_eq!(stored.file_names, vec!["data"]);
    }

    #[tokio::test]
    async fn test_duplicate_filename_fails_before_any_write() {
        let (service, repo, store) = service(registry());
        let req = request(
            r#"[{"name":"-f","value":"data"}]"#,
            vec![
                UploadedFile::new("a.txt", b"one".to_vec()),
                UploadedFile::new("a.txt", b"two".to_vec()),
            ],
        );

        assert!(matches!(
            service.launch(req).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(store.written_file_count(), 0);
        assert_eq!(
            repo.count_by_status(ProcessStatus::Scheduled).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_missing_required_file_fails_before_any_write() {
        let (service, _, store) = service(registry());
        // Script declares input option "data"; no uploaded file named "data"
        let req = request(
            r#"[{"name":"-f","value":"data"}]"#,
            vec![UploadedFile::new("other.txt", b"x".to_vec())],
        );

        assert!(matches!(
            service.launch(req).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(store.written_file_count(), 0);
    }

    #[tokio::test]
    async fn test_argument_parse_failure_returns_failed_handle() {
        let (service, repo, store) = service(registry());
        // Required -f is absent: argument parsing fails after the handle
        // exists, so the launch still succeeds and returns the handle
        let req = request(
            r#"[{"name":"-v"}]"#,
            vec![UploadedFile::new("data", b"x".to_vec())],
        );

        let process = service.launch(req).await.unwrap();
        assert_eq!(process.status, ProcessStatus::Failed);
        assert!(process
            .failure_message
            .as_deref()
            .unwrap()
            .contains("Failed to parse the arguments"));

        // Usage text was written to the process log, no input file was
        let dir = process.workspace_path.clone().unwrap();
        let log = store.log_lines(&dir).join("\n");
        assert!(log.contains("usage: import"));
        assert_eq!(store.written_file_count(), 0);

        let stored = repo.find_by_id(&process.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProcessStatus::Failed);
    }

    #[tokio::test]
    async fn test_failure_recording_errors_are_swallowed() {
        let (service, repo, _) = service(registry());
        // Required -f is absent, so the recovered parse-failure path runs.
        // The first update (workspace paths) succeeds; the second (the
        // failure record) is rejected and must be swallowed.
        repo.fail_updates_after(1);

        let req = request(
            r#"[{"name":"-v"}]"#,
            vec![UploadedFile::new("data", b"x".to_vec())],
        );
        let process = service.launch(req).await.unwrap();

        // Caller still gets the handle, marked failed in the response
        assert_eq!(process.status, ProcessStatus::Failed);

        // The store never saw the failure record
        let stored = repo.find_by_id(&process.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProcessStatus::Scheduled);
    }
}
