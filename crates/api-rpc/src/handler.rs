//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method.

use crate::error::{code, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    ConsumerOutcome, DeliverEventRequest, DeliverEventResponse, GetScriptRequest,
    LaunchProcessRequest, ListScriptsRequest, ListScriptsResponse, MaintenanceRequest,
    MaintenanceResponse, ProcessResponse, ProcessStatusRequest, ScriptInfo, StatsRequest,
    StatsResponse, TailLogsRequest, TailLogsResponse,
};
use base64::Engine;
use curator_core::application::{LaunchRequest, LaunchService, ScriptRegistry};
use curator_core::domain::{ProcessStatus, ScriptDescriptor, UploadedFile};
use curator_core::error::AppError;
use curator_core::port::{FileStore, Maintenance, ProcessRepository};
use curator_sync::EventDispatcher;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;

fn script_info(descriptor: &ScriptDescriptor) -> ScriptInfo {
    ScriptInfo {
        name: descriptor.name.clone(),
        description: descriptor.description.clone(),
        parameters: descriptor.parameters.clone(),
        input_file_options: descriptor.input_file_options.clone(),
    }
}

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    registry: Arc<ScriptRegistry>,
    launch_service: Arc<LaunchService>,
    process_repo: Arc<dyn ProcessRepository>,
    file_store: Arc<dyn FileStore>,
    maintenance: Arc<dyn Maintenance>,
    dispatcher: Arc<EventDispatcher>,
    rate_limiter: Arc<RateLimiter>,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(
        registry: Arc<ScriptRegistry>,
        launch_service: Arc<LaunchService>,
        process_repo: Arc<dyn ProcessRepository>,
        file_store: Arc<dyn FileStore>,
        maintenance: Arc<dyn Maintenance>,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        // Default: 200 burst, 100 req/sec (configurable via env)
        let max_burst: u32 = std::env::var("CURATOR_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        let rate_per_sec: u32 = std::env::var("CURATOR_RATE_LIMIT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            registry,
            launch_service,
            process_repo,
            file_store,
            maintenance,
            dispatcher,
            rate_limiter: Arc::new(RateLimiter::new(max_burst, rate_per_sec)),
            start_time: std::time::Instant::now(),
        }
    }

    fn check_rate_limit(&self) -> Result<(), ErrorObjectOwned> {
        if !self.rate_limiter.check() {
            return Err(ErrorObjectOwned::owned(
                code::THROTTLED,
                "Rate limit exceeded. Please slow down.",
                None::<()>,
            ));
        }
        Ok(())
    }

    /// script.list.v1
    pub async fn list_scripts(
        &self,
        params: ListScriptsRequest,
    ) -> Result<ListScriptsResponse, ErrorObjectOwned> {
        self.check_rate_limit()?;

        let principal = params.principal.into();
        let scripts = self
            .registry
            .list(&principal)
            .into_iter()
            .map(script_info)
            .collect();

        Ok(ListScriptsResponse { scripts })
    }

    /// script.get.v1
    pub async fn get_script(
        &self,
        params: GetScriptRequest,
    ) -> Result<ScriptInfo, ErrorObjectOwned> {
        self.check_rate_limit()?;

        let principal = params.principal.into();
        let descriptor = self
            .registry
            .get_authorized(&params.name, &principal)
            .map_err(to_rpc_error)?;

        Ok(script_info(descriptor))
    }

    /// process.launch.v1
    pub async fn launch_process(
        &self,
        params: LaunchProcessRequest,
    ) -> Result<ProcessResponse, ErrorObjectOwned> {
        self.check_rate_limit()?;

        let mut files = Vec::with_capacity(params.files.len());
        for part in params.files {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&part.content_base64)
                .map_err(|e| {
                    to_rpc_error(AppError::Validation(format!(
                        "File part {} is not valid base64: {}",
                        part.name, e
                    )))
                })?;
            files.push(UploadedFile::new(part.name, bytes));
        }

        let process = self
            .launch_service
            .launch(LaunchRequest {
                script_name: params.script,
                properties: params.properties,
                files,
                principal: params.principal.into(),
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(process.into())
    }

    /// process.status.v1
    pub async fn process_status(
        &self,
        params: ProcessStatusRequest,
    ) -> Result<ProcessResponse, ErrorObjectOwned> {
        self.check_rate_limit()?;

        let process = self
            .process_repo
            .find_by_id(&params.process_id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "Process {} not found",
                    params.process_id
                )))
            })?;

        Ok(process.into())
    }

    /// logs.tail.v1
    pub async fn tail_logs(
        &self,
        params: TailLogsRequest,
    ) -> Result<TailLogsResponse, ErrorObjectOwned> {
        self.check_rate_limit()?;

        let process = self
            .process_repo
            .find_by_id(&params.process_id)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "Process {} not found",
                    params.process_id
                )))
            })?;

        let lines = match process.log_path.as_deref() {
            Some(log_path) => self
                .file_store
                .tail_log(log_path, params.lines)
                .await
                .map_err(to_rpc_error)?,
            None => Vec::new(),
        };

        Ok(TailLogsResponse {
            process_id: process.id,
            log_path: process.log_path,
            lines,
        })
    }

    /// sync.deliver.v1
    pub async fn deliver_event(
        &self,
        params: DeliverEventRequest,
    ) -> Result<DeliverEventResponse, ErrorObjectOwned> {
        self.check_rate_limit()?;

        let outcomes = self
            .dispatcher
            .deliver(&params.event)
            .await
            .into_iter()
            .map(|(consumer, outcome)| ConsumerOutcome {
                consumer,
                outcome: outcome.to_string(),
            })
            .collect();

        Ok(DeliverEventResponse { outcomes })
    }

    /// admin.stats.v1
    pub async fn stats(&self, _params: StatsRequest) -> Result<StatsResponse, ErrorObjectOwned> {
        self.check_rate_limit()?;

        let scheduled = self
            .process_repo
            .count_by_status(ProcessStatus::Scheduled)
            .await
            .map_err(to_rpc_error)?;
        let running = self
            .process_repo
            .count_by_status(ProcessStatus::Running)
            .await
            .map_err(to_rpc_error)?;
        let completed = self
            .process_repo
            .count_by_status(ProcessStatus::Completed)
            .await
            .map_err(to_rpc_error)?;
        let failed = self
            .process_repo
            .count_by_status(ProcessStatus::Failed)
            .await
            .map_err(to_rpc_error)?;

        let maintenance_stats = self.maintenance.get_stats().await.map_err(to_rpc_error)?;

        Ok(StatsResponse {
            scheduled_processes: scheduled,
            running_processes: running,
            completed_processes: completed,
            failed_processes: failed,
            db_size_bytes: maintenance_stats.db_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }

    /// admin.maintenance.v1
    pub async fn maintenance(
        &self,
        params: MaintenanceRequest,
    ) -> Result<MaintenanceResponse, ErrorObjectOwned> {
        self.check_rate_limit()?;

        let stats_before = self.maintenance.get_stats().await.map_err(to_rpc_error)?;

        let config = curator_core::port::MaintenanceConfig::default();
        let (processes_deleted, workspaces_deleted) = self
            .maintenance
            .gc_finished_processes(config.finished_process_retention_days)
            .await
            .map_err(to_rpc_error)?;

        let vacuum_run =
            params.force_vacuum || stats_before.db_size_mb > config.max_db_size_mb;
        if vacuum_run {
            self.maintenance.vacuum().await.map_err(to_rpc_error)?;
        }

        let stats_after = self.maintenance.get_stats().await.map_err(to_rpc_error)?;

        Ok(MaintenanceResponse {
            vacuum_run,
            processes_deleted,
            workspaces_deleted,
            db_size_before: stats_before.db_size_bytes,
            db_size_after: stats_after.db_size_bytes,
        })
    }
}
