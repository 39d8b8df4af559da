//! Curator Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    ConsumerOutcome, LaunchRequest, Principal, ProcessResponse, ScriptInfo, TailLogsRequest,
    TailLogsResponse,
};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde_json::json;
use std::time::Duration;

/// Curator daemon client
///
/// # Example
///
/// ```no_run
/// use curator_sdk::CuratorClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CuratorClient::connect("http://127.0.0.1:9533").await?;
/// # Ok(())
/// # }
/// ```
pub struct CuratorClient {
    client: HttpClient,
}

impl CuratorClient {
    /// Connect to the Curator daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9533`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Launch a script as a tracked background process
    pub async fn launch(&self, request: LaunchRequest) -> Result<ProcessResponse> {
        let params = rpc_params![request];
        let response: ProcessResponse = self.client.request("process.launch.v1", params).await?;

        Ok(response)
    }

    /// Poll one process by ID
    pub async fn process_status(&self, process_id: &str) -> Result<ProcessResponse> {
        let params = rpc_params![json!({ "process_id": process_id })];
        let response: ProcessResponse = self.client.request("process.status.v1", params).await?;

        Ok(response)
    }

    /// List scripts the principal may execute
    pub async fn list_scripts(&self, principal: &Principal) -> Result<Vec<ScriptInfo>> {
        let params = rpc_params![json!({ "principal": principal })];
        let response: serde_json::Value = self.client.request("script.list.v1", params).await?;

        Ok(serde_json::from_value(response["scripts"].clone())?)
    }

    /// Tail a process log
    pub async fn tail_logs(
        &self,
        process_id: &str,
        lines: Option<usize>,
    ) -> Result<TailLogsResponse> {
        let request = TailLogsRequest {
            process_id: process_id.to_string(),
            lines: lines.unwrap_or(50),
        };
        let params = rpc_params![request];
        let response: TailLogsResponse = self.client.request("logs.tail.v1", params).await?;

        Ok(response)
    }

    /// Deliver a content event to the sync pipeline
    ///
    /// The event value must match the daemon's SyncEvent wire shape.
    pub async fn deliver_event(&self, event: serde_json::Value) -> Result<Vec<ConsumerOutcome>> {
        let params = rpc_params![json!({ "event": event })];
        let response: serde_json::Value = self.client.request("sync.deliver.v1", params).await?;

        Ok(serde_json::from_value(response["outcomes"].clone())?)
    }
}
