// SQLite ProcessRepository Implementation

use async_trait::async_trait;
use curator_core::domain::{Process, ProcessId, ProcessStatus};
use curator_core::error::{AppError, Result};
use curator_core::port::ProcessRepository;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::Database(format!(
                        "Unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::Database(format!(
                        "Database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => AppError::Database(format!("Database full: {}", db_err.message())),
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        _ => AppError::Database(err.to_string()),
    }
}

fn row_to_process(row: &SqliteRow) -> Result<Process> {
    let status_str: String = row.try_get("status").map_err(map_sqlx_error)?;
    let owner_json: String = row.try_get("owner").map_err(map_sqlx_error)?;
    let parameters_json: String = row.try_get("parameters").map_err(map_sqlx_error)?;
    let file_names_json: String = row.try_get("file_names").map_err(map_sqlx_error)?;

    Ok(Process {
        id: row.try_get("id").map_err(map_sqlx_error)?,
        script_name: row.try_get("script_name").map_err(map_sqlx_error)?,
        owner: serde_json::from_str(&owner_json)?,
        parameters: serde_json::from_str(&parameters_json)?,
        file_names: serde_json::from_str(&file_names_json)?,
        status: ProcessStatus::from_str(&status_str)?,
        created_at: row.try_get("created_at").map_err(map_sqlx_error)?,
        started_at: row.try_get("started_at").map_err(map_sqlx_error)?,
        finished_at: row.try_get("finished_at").map_err(map_sqlx_error)?,
        workspace_path: row.try_get("workspace_path").map_err(map_sqlx_error)?,
        log_path: row.try_get("log_path").map_err(map_sqlx_error)?,
        pid: row.try_get("pid").map_err(map_sqlx_error)?,
        exit_code: row.try_get("exit_code").map_err(map_sqlx_error)?,
        failure_message: row.try_get("failure_message").map_err(map_sqlx_error)?,
    })
}

pub struct SqliteProcessRepository {
    pool: SqlitePool,
}

impl SqliteProcessRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProcessRepository for SqliteProcessRepository {
    async fn insert(&self, process: &Process) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processes (
                id, script_name, owner, parameters, file_names,
                status, created_at, started_at, finished_at,
                workspace_path, log_path, pid, exit_code, failure_message
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&process.id)
        .bind(&process.script_name)
        .bind(serde_json::to_string(&process.owner)?)
        .bind(serde_json::to_string(&process.parameters)?)
        .bind(serde_json::to_string(&process.file_names)?)
        .bind(process.status.to_string())
        .bind(process.created_at)
        .bind(process.started_at)
        .bind(process.finished_at)
        .bind(&process.workspace_path)
        .bind(&process.log_path)
        .bind(process.pid)
        .bind(process.exit_code)
        .bind(&process.failure_message)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &ProcessId) -> Result<Option<Process>> {
        let row = sqlx::query("SELECT * FROM processes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_process).transpose()
    }

    async fn update(&self, process: &Process) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE processes SET
                status = ?, started_at = ?, finished_at = ?,
                workspace_path = ?, log_path = ?, pid = ?,
                exit_code = ?, failure_message = ?
            WHERE id = ?
            "#,
        )
        .bind(process.status.to_string())
        .bind(process.started_at)
        .bind(process.finished_at)
        .bind(&process.workspace_path)
        .bind(&process.log_path)
        .bind(process.pid)
        .bind(process.exit_code)
        .bind(&process.failure_message)
        .bind(&process.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Process {} not found",
                process.id
            )));
        }
        Ok(())
    }

    async fn pop_next_scheduled(&self, now_millis: i64) -> Result<Option<Process>> {
        // Single-statement claim: status flips to RUNNING atomically, so
        // concurrent workers cannot double-claim
        let row = sqlx::query(
            r#"
            UPDATE processes
            SET status = 'RUNNING', started_at = ?
            WHERE id = (
                SELECT id FROM processes
                WHERE status = 'SCHEDULED'
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(now_millis)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_process).transpose()
    }

    async fn find_by_status(&self, status: ProcessStatus) -> Result<Vec<Process>> {
        let rows = sqlx::query("SELECT * FROM processes WHERE status = ? ORDER BY created_at ASC")
            .bind(status.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_process).collect()
    }

    async fn count_by_status(&self, status: ProcessStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM processes WHERE status = ?")
            .bind(status.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use curator_core::domain::{CommandLineParameter, Principal};

    async fn repository() -> SqliteProcessRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteProcessRepository::new(pool)
    }

    fn sample_process(id: &str, created_at: i64) -> Process {
        Process::new(
            id,
            created_at,
            "metadata-export",
            Principal::new("alice", vec!["curators".to_string()]),
            vec![CommandLineParameter::with_value("-i", "data.csv")],
            vec!["data.csv".to_string()],
        )
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip() {
        let repo = repository().await;
        let process = sample_process("p-1", 1000);
        repo.insert(&process).await.unwrap();

        let found = repo.find_by_id(&"p-1".to_string()).await.unwrap().unwrap();
        assert_eq!(found.script_name, "metadata-export");
        assert_eq!(found.owner.name, "alice");
        assert_eq!(found.owner.groups, vec!["curators"]);
        assert_eq!(
            found.parameters,
            vec![CommandLineParameter::with_value("-i", "data.csv")]
        );
        assert_eq!(found.status, ProcessStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_pop_next_scheduled_claims_fifo() {
        let repo = repository().await;
        repo.insert(&sample_process("p-2", 2000)).await.unwrap();
        repo.insert(&sample_process("p-1", 1000)).await.unwrap();

        let first = repo.pop_next_scheduled(5000).await.unwrap().unwrap();
        assert_eq!(first.id, "p-1");
        assert_eq!(first.status, ProcessStatus::Running);
        assert_eq!(first.started_at, Some(5000));

        let second = repo.pop_next_scheduled(6000).await.unwrap().unwrap();
        assert_eq!(second.id, "p-2");

        assert!(repo.pop_next_scheduled(7000).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_counts() {
        let repo = repository().await;
        repo.insert(&sample_process("p-1", 1000)).await.unwrap();

        let mut process = repo.pop_next_scheduled(2000).await.unwrap().unwrap();
        process.complete(3000).unwrap();
        process.exit_code = Some(0);
        repo.update(&process).await.unwrap();

        assert_eq!(
            repo.count_by_status(ProcessStatus::Completed).await.unwrap(),
            1
        );
        assert_eq!(
            repo.count_by_status(ProcessStatus::Scheduled).await.unwrap(),
            0
        );

        let found = repo.find_by_id(&"p-1".to_string()).await.unwrap().unwrap();
        assert_eq!(found.exit_code, Some(0));
        assert_eq!(found.finished_at, Some(3000));
    }

    #[tokio::test]
    async fn test_update_missing_process_is_not_found() {
        let repo = repository().await;
        let process = sample_process("ghost", 1000);
        assert!(matches!(
            repo.update(&process).await,
            Err(AppError::NotFound(_))
        ));
    }
}
