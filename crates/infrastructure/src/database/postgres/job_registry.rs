use async_trait::async_trait;
use sqlx::{PgPool, Row};
use taskplane_core::{TaskPlaneError, TaskPlaneResult};
use taskplane_domain::{JobRegistration, JobRegistry};
use tracing::{debug, instrument};

/// 执行端运行中任务表，控制面只读取 `id` 列
pub struct PostgresJobRegistry {
    pool: PgPool,
}

impl PostgresJobRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRegistry for PostgresJobRegistry {
    #[instrument(skip(self, keys), fields(key_count = keys.len()))]
    async fn find_by_ids(&self, keys: &[String]) -> TaskPlaneResult<Vec<JobRegistration>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query("SELECT id FROM job_registry WHERE id = ANY($1)")
            .bind(keys)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(JobRegistration {
                    id: row.try_get("id")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> TaskPlaneResult<()> {
        let result = sqlx::query("DELETE FROM job_registry WHERE id = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TaskPlaneError::job_not_found(key));
        }
        debug!("删除执行端任务记录: {}", key);
        Ok(())
    }
}
