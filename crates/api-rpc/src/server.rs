//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server over localhost TCP.

use crate::handler::RpcHandler;
use crate::types::{
    DeliverEventRequest, GetScriptRequest, LaunchProcessRequest, ListScriptsRequest,
    MaintenanceRequest, ProcessStatusRequest, StatsRequest, TailLogsRequest,
};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::sync::Arc;
use tracing::info;

// Security: only binds to 127.0.0.1, no external access
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9533;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handler: RpcHandler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }

    /// Start the JSON-RPC server
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP (localhost only)"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let mut module = RpcModule::new(());

        // Register methods
        let handler = self.handler.clone();
        module
            .register_async_method("script.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ListScriptsRequest = params.parse()?;
                    handler.list_scripts(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("script.get.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: GetScriptRequest = params.parse()?;
                    handler.get_script(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("process.launch.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: LaunchProcessRequest = params.parse()?;
                    handler.launch_process(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("process.status.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ProcessStatusRequest = params.parse()?;
                    handler.process_status(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("logs.tail.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: TailLogsRequest = params.parse()?;
                    handler.tail_logs(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("sync.deliver.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: DeliverEventRequest = params.parse()?;
                    handler.deliver_event(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Admin APIs
        let handler = self.handler.clone();
        module
            .register_async_method("admin.stats.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: StatsRequest = params.parse()?;
                    handler.stats(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("admin.maintenance.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: MaintenanceRequest = params.parse()?;
                    handler.maintenance(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        info!("JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok(handle)
    }
}
