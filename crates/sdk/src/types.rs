//! SDK Request/Response Types
//!
//! Mirrors the JSON-RPC types from the api-rpc crate.

use serde::{Deserialize, Serialize};

/// Caller identity sent with authenticated requests
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub admin: bool,
}

impl Principal {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            admin: false,
        }
    }

    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            admin: true,
        }
    }
}

/// One uploaded file part
#[derive(Debug, Clone, Serialize)]
pub struct FilePart {
    pub name: String,
    pub content_base64: String,
}

impl FilePart {
    /// Build a part from raw bytes
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        use base64::Engine;
        Self {
            name: name.into(),
            content_base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// Request to launch a script
#[derive(Debug, Clone, Serialize)]
pub struct LaunchRequest {
    pub script: String,
    pub properties: Option<String>,
    #[serde(default)]
    pub files: Vec<FilePart>,
    pub principal: Principal,
}

/// A process resource as returned by launch/status
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessResponse {
    pub process_id: String,
    pub script: String,
    pub status: String,
    pub owner: String,
    pub file_names: Vec<String>,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub exit_code: Option<i32>,
    pub failure_message: Option<String>,
}

/// One script descriptor as returned by script.list/get
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptInfo {
    pub name: String,
    pub description: String,
    pub input_file_options: Vec<String>,
}

/// Request to tail process logs
#[derive(Debug, Clone, Serialize)]
pub struct TailLogsRequest {
    pub process_id: String,
    pub lines: usize,
}

/// Response from tail logs operation
#[derive(Debug, Clone, Deserialize)]
pub struct TailLogsResponse {
    pub process_id: String,
    pub log_path: Option<String>,
    pub lines: Vec<String>,
}

/// One consumer's outcome for a delivered event
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerOutcome {
    pub consumer: String,
    pub outcome: String,
}
