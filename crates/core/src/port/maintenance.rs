// Registry Maintenance port
use crate::error::Result;
use async_trait::async_trait;

/// Registry maintenance statistics
#[derive(Debug, Clone)]
pub struct MaintenanceStats {
    pub db_size_mb: f64,
    pub db_size_bytes: i64,
    pub process_count: i64,
    pub finished_process_count: i64,
    pub workspaces_deleted: usize,
}

/// Maintenance configuration
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Retention period for finished processes (days)
    pub finished_process_retention_days: i64,

    /// Maximum DB size before forcing VACUUM (MB)
    pub max_db_size_mb: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            finished_process_retention_days: 7, // Keep finished processes for 7 days
            max_db_size_mb: 1000.0,             // 1GB max
        }
    }
}

/// Process registry maintenance operations
#[async_trait]
pub trait Maintenance: Send + Sync {
    /// Run VACUUM to reclaim space and optimize the registry DB
    ///
    /// # Returns
    /// Space reclaimed in MB
    async fn vacuum(&self) -> Result<f64>;

    /// Delete finished processes (and their workspaces) older than the
    /// retention period
    ///
    /// # Returns
    /// (processes deleted, workspaces deleted)
    async fn gc_finished_processes(&self, retention_days: i64) -> Result<(i64, usize)>;

    /// Get maintenance statistics
    async fn get_stats(&self) -> Result<MaintenanceStats>;

    /// Run full maintenance (GC + conditional VACUUM)
    async fn run_full_maintenance(&self, config: &MaintenanceConfig) -> Result<MaintenanceStats> {
        let stats_before = self.get_stats().await?;

        let (deleted_processes, deleted_workspaces) = self
            .gc_finished_processes(config.finished_process_retention_days)
            .await?;

        let reclaimed_mb = if stats_before.db_size_mb > config.max_db_size_mb {
            self.vacuum().await?
        } else {
            0.0
        };

        let mut stats_after = self.get_stats().await?;
        stats_after.workspaces_deleted = deleted_workspaces;

        tracing::info!(
            deleted_processes = deleted_processes,
            deleted_workspaces = deleted_workspaces,
            reclaimed_mb = reclaimed_mb,
            db_size_mb = stats_after.db_size_mb,
            "Maintenance completed"
        );

        Ok(stats_after)
    }
}
