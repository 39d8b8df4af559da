//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results.

use curator_core::domain::{CommandLineParameter, ParameterSpec, Principal, Process};
use serde::{Deserialize, Serialize};

/// Caller identity attached to authenticated requests.
///
/// The daemon binds to localhost only; the surrounding platform is trusted
/// to assert who is calling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalParam {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub admin: bool,
}

impl From<PrincipalParam> for Principal {
    fn from(p: PrincipalParam) -> Self {
        Principal {
            name: p.name,
            groups: p.groups,
            is_admin: p.admin,
        }
    }
}

/// script.list.v1 - Scripts the caller may execute
#[derive(Debug, Deserialize)]
pub struct ListScriptsRequest {
    pub principal: PrincipalParam,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptInfo {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    pub input_file_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListScriptsResponse {
    pub scripts: Vec<ScriptInfo>,
}

/// script.get.v1 - One script descriptor
#[derive(Debug, Deserialize)]
pub struct GetScriptRequest {
    pub name: String,
    pub principal: PrincipalParam,
}

/// process.launch.v1 - Launch a script as a background process
#[derive(Debug, Deserialize)]
pub struct LaunchProcessRequest {
    pub script: String,

    /// JSON array of `{name, value?}` objects, passed through verbatim
    #[serde(default)]
    pub properties: Option<String>,

    #[serde(default)]
    pub files: Vec<FilePart>,

    pub principal: PrincipalParam,
}

/// One uploaded file part, base64-encoded for transport
#[derive(Debug, Deserialize)]
pub struct FilePart {
    pub name: String,
    pub content_base64: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResponse {
    pub process_id: String,
    pub script: String,
    pub status: String,
    pub owner: String,
    pub parameters: Vec<CommandLineParameter>,
    pub file_names: Vec<String>,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub exit_code: Option<i32>,
    pub failure_message: Option<String>,
}

impl From<Process> for ProcessResponse {
    fn from(p: Process) -> Self {
        Self {
            process_id: p.id,
            script: p.script_name,
            status: p.status.to_string(),
            owner: p.owner.name,
            parameters: p.parameters,
            file_names: p.file_names,
            created_at: p.created_at,
            started_at: p.started_at,
            finished_at: p.finished_at,
            exit_code: p.exit_code,
            failure_message: p.failure_message,
        }
    }
}

/// process.status.v1 - Poll one process
#[derive(Debug, Deserialize)]
pub struct ProcessStatusRequest {
    pub process_id: String,
}

/// logs.tail.v1 - Tail a process log
#[derive(Debug, Deserialize)]
pub struct TailLogsRequest {
    pub process_id: String,
    #[serde(default = "default_lines")]
    pub lines: usize,
}

fn default_lines() -> usize {
    50
}

#[derive(Debug, Clone, Serialize)]
pub struct TailLogsResponse {
    pub process_id: String,
    pub log_path: Option<String>,
    pub lines: Vec<String>,
}

/// sync.deliver.v1 - Deliver a content event to the consumer pipeline
#[derive(Debug, Deserialize)]
pub struct DeliverEventRequest {
    pub event: curator_sync::SyncEvent,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsumerOutcome {
    pub consumer: String,
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliverEventResponse {
    pub outcomes: Vec<ConsumerOutcome>,
}

/// admin.stats.v1 - System statistics
#[derive(Debug, Deserialize)]
pub struct StatsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub scheduled_processes: i64,
    pub running_processes: i64,
    pub completed_processes: i64,
    pub failed_processes: i64,
    pub db_size_bytes: i64,
    pub uptime_seconds: i64,
}

/// admin.maintenance.v1 - Run manual maintenance
#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    #[serde(default)]
    pub force_vacuum: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceResponse {
    pub vacuum_run: bool,
    pub processes_deleted: i64,
    pub workspaces_deleted: usize,
    pub db_size_before: i64,
    pub db_size_after: i64,
}
