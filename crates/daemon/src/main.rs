//! Curator Daemon - Main Entry Point
//! Script registry + background process worker + sync pipeline

mod scripts_config;
mod telemetry;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use curator_api_rpc::{RpcHandler, RpcServer, RpcServerConfig};
use curator_core::application::recovery::RecoveryService;
use curator_core::application::worker::{shutdown_channel, Worker};
use curator_core::application::{LaunchService, MaintenanceScheduler};
use curator_core::port::id_provider::UuidProvider;
use curator_core::port::time_provider::SystemTimeProvider;
use curator_core::port::MaintenanceConfig;
use curator_infra_sqlite::{create_pool, run_migrations, SqliteMaintenance, SqliteProcessRepository};
use curator_infra_system::{FsWorkspaceStore, SubprocessScriptExecutor};
use curator_sync::{
    ElectronicVersionLinkConsumer, EventDispatcher, HttpDispatchNotifier, ResearchApiClient,
    SyncConfig,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_DB_PATH: &str = "~/.curator/registry.db";
const DEFAULT_DATA_DIR: &str = "~/.curator/workspaces";
const DEFAULT_SCRIPTS_FILE: &str = "~/.curator/scripts.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging (JSON format for production)
    let log_format = std::env::var("CURATOR_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Curator Daemon v{} starting...", VERSION);

    // 1.1. Initialize OpenTelemetry (optional)
    if let Err(e) = telemetry::init_telemetry() {
        tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    // 2. Load configuration
    let db_path = std::env::var("CURATOR_DB_PATH")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());
    let data_dir = std::env::var("CURATOR_DATA_DIR")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DATA_DIR).into_owned());
    let scripts_file = std::env::var("CURATOR_SCRIPTS_FILE")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_SCRIPTS_FILE).into_owned());

    let rpc_port: u16 = std::env::var("CURATOR_RPC_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9533);

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir_all(&data_dir)?;

    info!(db_path = %db_path, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let process_repo = Arc::new(SqliteProcessRepository::new(pool.clone()));
    let file_store = Arc::new(FsWorkspaceStore::new(&data_dir));

    let script_executor = Arc::new(SubprocessScriptExecutor::new(
        time_provider.clone(),
        vec!["PATH".to_string(), "HOME".to_string(), "USER".to_string()],
    ));

    let registry = Arc::new(scripts_config::load_registry(&scripts_file)?);

    let launch_service = Arc::new(LaunchService::new(
        registry.clone(),
        process_repo.clone(),
        file_store.clone(),
        id_provider.clone(),
        time_provider.clone(),
    ));

    // 5. Wire the sync pipeline
    let sync_config = SyncConfig::from_env();
    let research_api = Arc::new(ResearchApiClient::new(
        sync_config.api_base_url.clone().unwrap_or_default(),
        sync_config.api_key.clone().unwrap_or_default(),
    ));
    let dispatch_sink = match (&sync_config.dispatcher_url, &sync_config.dispatcher_key) {
        (Some(url), Some(key)) => Some(Arc::new(HttpDispatchNotifier::new(url.clone(), key.clone()))
            as Arc<dyn curator_sync::DispatchSink>),
        _ => None,
    };
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Arc::new(ElectronicVersionLinkConsumer::new(
        sync_config,
        research_api,
        dispatch_sink,
    )));
    let dispatcher = Arc::new(dispatcher);

    // 6. Run crash recovery
    info!("Running crash recovery...");
    let recovery_service = RecoveryService::new(
        process_repo.clone(),
        script_executor.clone(),
        time_provider.clone(),
        None, // Use default recovery window
    );

    match recovery_service.recover_orphaned_processes().await {
        Ok(count) => info!(recovered_processes = count, "Crash recovery completed"),
        Err(e) => tracing::error!(error = ?e, "Crash recovery failed"),
    }

    // 7. Initialize maintenance service (needed for RPC server)
    let maintenance = Arc::new(SqliteMaintenance::new(pool.clone(), time_provider.clone()));

    // 8. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        port: rpc_port,
        ..Default::default()
    };
    let handler = RpcHandler::new(
        registry.clone(),
        launch_service,
        process_repo.clone(),
        file_store.clone(),
        maintenance.clone(),
        dispatcher,
    );
    let rpc_server = RpcServer::new(rpc_config, handler);
    let rpc_handle = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 9. Start Worker (process execution loop)
    info!("Starting worker...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let worker = Worker::new(
        registry,
        process_repo.clone(),
        script_executor,
        time_provider.clone(),
    );

    let worker_handle = tokio::spawn(async move {
        if let Err(e) = worker.run(shutdown_rx).await {
            tracing::error!(error = ?e, "Worker failed");
        }
    });

    // 10. Start Maintenance Scheduler
    info!("Starting maintenance scheduler...");
    let maintenance_config = MaintenanceConfig::default(); // 7 days retention
    let maintenance_scheduler = MaintenanceScheduler::new(
        maintenance,
        maintenance_config,
        24, // Run every 24 hours
    );

    tokio::spawn(async move {
        maintenance_scheduler.run().await;
    });

    info!("System ready. Waiting for requests...");
    info!("Press Ctrl+C to shutdown");

    // 11. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    shutdown_tx.shutdown();
    let _ = worker_handle.await;
    let _ = rpc_handle.stop();

    info!("Curator Daemon stopped");
    Ok(())
}
