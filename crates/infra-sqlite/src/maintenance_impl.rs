// SQLite Maintenance Implementation
use async_trait::async_trait;
use curator_core::error::{AppError, Result};
use curator_core::port::{Maintenance, MaintenanceStats, TimeProvider};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::{info, warn};

/// SQLite maintenance implementation
pub struct SqliteMaintenance {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteMaintenance {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Get DB file size in bytes from page statistics
    async fn get_db_size_bytes(&self) -> Result<i64> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page count: {}", e)))?;

        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get page size: {}", e)))?;

        Ok(page_count * page_size)
    }
}

#[async_trait]
impl Maintenance for SqliteMaintenance {
    async fn vacuum(&self) -> Result<f64> {
        info!("Running VACUUM to optimize database...");

        let size_before = self.get_db_size_bytes().await? as f64 / (1024.0 * 1024.0);

        sqlx::query("VACUUM")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("VACUUM failed: {}", e)))?;

        let size_after = self.get_db_size_bytes().await? as f64 / (1024.0 * 1024.0);
        let reclaimed = (size_before - size_after).max(0.0);

        info!(reclaimed_mb = reclaimed, "VACUUM completed");
        Ok(reclaimed)
    }

    async fn gc_finished_processes(&self, retention_days: i64) -> Result<(i64, usize)> {
        let now = self.time_provider.now_millis();
        let cutoff = now - retention_days * 24 * 3600 * 1000;

        // Collect workspaces before deleting the rows that reference them
        let rows = sqlx::query(
            r#"
            SELECT workspace_path FROM processes
            WHERE status IN ('COMPLETED', 'FAILED')
              AND finished_at IS NOT NULL AND finished_at < ?
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let workspaces: Vec<String> = rows
            .iter()
            .filter_map(|r| r.try_get::<Option<String>, _>("workspace_path").ok().flatten())
            .collect();

        let result = sqlx::query(
            r#"
            DELETE FROM processes
            WHERE status IN ('COMPLETED', 'FAILED')
              AND finished_at IS NOT NULL AND finished_at < ?
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let mut workspaces_deleted = 0;
        for dir in &workspaces {
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => workspaces_deleted += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(dir = %dir, error = %e, "Failed to remove workspace"),
            }
        }

        info!(
            processes_deleted = result.rows_affected(),
            workspaces_deleted = workspaces_deleted,
            retention_days = retention_days,
            "Finished-process GC completed"
        );
        Ok((result.rows_affected() as i64, workspaces_deleted))
    }

    async fn get_stats(&self) -> Result<MaintenanceStats> {
        let db_size_bytes = self.get_db_size_bytes().await?;

        let process_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processes")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let finished_process_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM processes WHERE status IN ('COMPLETED', 'FAILED')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(MaintenanceStats {
            db_size_mb: db_size_bytes as f64 / (1024.0 * 1024.0),
            db_size_bytes,
            process_count,
            finished_process_count,
            workspaces_deleted: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, SqliteProcessRepository};
    use curator_core::domain::{Principal, Process};
    use curator_core::port::time_provider::TimeProvider;
    use curator_core::port::ProcessRepository;

    struct FixedTime(i64);
    impl TimeProvider for FixedTime {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    #[tokio::test]
    async fn test_gc_deletes_only_old_finished_processes() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqliteProcessRepository::new(pool.clone());

        let day_ms = 24 * 3600 * 1000;
        let now = 100 * day_ms;

        // Old failed process (eligible)
        let mut old = Process::new("old", 1000, "export", Principal::admin("root"), vec![], vec![]);
        old.fail(2000, "boom");
        repo.insert(&old).await.unwrap();

        // Fresh completed process (kept)
        let mut fresh =
            Process::new("fresh", now - 1000, "export", Principal::admin("root"), vec![], vec![]);
        fresh.status = curator_core::domain::ProcessStatus::Running;
        fresh.started_at = Some(now - 900);
        fresh.complete(now - 500).unwrap();
        repo.insert(&fresh).await.unwrap();

        // Scheduled process (never eligible)
        repo.insert(&Process::new("queued", now, "export", Principal::admin("root"), vec![], vec![]))
            .await
            .unwrap();

        let maintenance = SqliteMaintenance::new(pool, Arc::new(FixedTime(now)));
        let (deleted, _) = maintenance.gc_finished_processes(7).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(repo.find_by_id(&"old".to_string()).await.unwrap().is_none());
        assert!(repo.find_by_id(&"fresh".to_string()).await.unwrap().is_some());
        assert!(repo.find_by_id(&"queued".to_string()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqliteProcessRepository::new(pool.clone());

        repo.insert(&Process::new("p-1", 1000, "export", Principal::admin("root"), vec![], vec![]))
            .await
            .unwrap();

        let maintenance = SqliteMaintenance::new(pool, Arc::new(FixedTime(5000)));
        let stats = maintenance.get_stats().await.unwrap();

        assert_eq!(stats.process_count, 1);
        assert_eq!(stats.finished_process_count, 0);
        assert!(stats.db_size_bytes > 0);
    }
}
